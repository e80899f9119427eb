//! Draws the layer tree on any RGB565 draw target.

use embedded_graphics::{
    mono_font::{MonoFont, MonoTextStyle},
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{Circle, Line, Polyline, PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};
use profont::{PROFONT_10_POINT, PROFONT_14_POINT, PROFONT_24_POINT};

use super::{FaceLayers, LayerId, Resource};
use crate::config::layout::{self, Bounds};
use crate::weather::WeatherIcon;

pub const BACKGROUND_COLOR: Rgb565 = Rgb565::BLACK;
pub const STATUS_BAR_COLOR: Rgb565 = Rgb565::new(4, 8, 4);
pub const TEXT_COLOR: Rgb565 = Rgb565::WHITE;
pub const METER_COLOR: Rgb565 = Rgb565::WHITE;
const CONNECTION_COLOR: Rgb565 = Rgb565::BLUE;
const SUN_COLOR: Rgb565 = Rgb565::YELLOW;
const CLOUD_COLOR: Rgb565 = Rgb565::new(20, 40, 20);
const RAIN_COLOR: Rgb565 = Rgb565::CYAN;

/// Draw every dirty layer and clear the dirty set.
pub fn paint<D>(layers: &mut FaceLayers, target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    for layer in layers.take_dirty().iter() {
        draw_layer(layers, layer, target)?;
    }
    Ok(())
}

fn rectangle((x, y, w, h): Bounds) -> Rectangle {
    Rectangle::new(Point::new(x, y), Size::new(w, h))
}

fn fill<D>(target: &mut D, area: Rectangle, color: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    area.into_styled(PrimitiveStyle::with_fill(color)).draw(target)
}

fn font(resource: Resource) -> &'static MonoFont<'static> {
    match resource {
        Resource::TimeFont => &PROFONT_24_POINT,
        Resource::AlertFont => &PROFONT_10_POINT,
        _ => &PROFONT_14_POINT,
    }
}

fn draw_layer<D>(layers: &FaceLayers, layer: LayerId, target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    if layer == LayerId::Background {
        target.clear(BACKGROUND_COLOR)?;
        return fill(target, rectangle(layout::STATUS_BAR), STATUS_BAR_COLOR);
    }

    let area = rectangle(layer.bounds());
    let background = if layer.in_status_bar() {
        STATUS_BAR_COLOR
    } else {
        BACKGROUND_COLOR
    };
    fill(target, area, background)?;

    if layers.is_hidden(layer) {
        return Ok(());
    }

    let mut clipped = target.clipped(&area);
    let origin = area.top_left;
    match layer.resource() {
        Resource::Meter => fill(
            &mut clipped,
            Rectangle::new(origin, Size::new(layers.bar_width(), area.size.height)),
            METER_COLOR,
        ),
        Resource::ConnectionImage => draw_connection(&mut clipped, origin),
        Resource::WeatherImages => draw_weather_icon(&mut clipped, origin, layers.icon()),
        Resource::BackgroundImage => Ok(()),
        text_font => {
            let style = MonoTextStyle::new(font(text_font), TEXT_COLOR);
            Text::with_baseline(layers.text(layer), origin, style, Baseline::Top)
                .draw(&mut clipped)
                .map(|_| ())
        }
    }
}

fn draw_connection<D>(target: &mut D, origin: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    // Bluetooth rune
    let points = [
        origin + Point::new(3, 4),
        origin + Point::new(12, 11),
        origin + Point::new(8, 15),
        origin + Point::new(8, 0),
        origin + Point::new(12, 4),
        origin + Point::new(3, 11),
    ];
    Polyline::new(&points)
        .into_styled(PrimitiveStyle::with_stroke(CONNECTION_COLOR, 2))
        .draw(target)
}

fn draw_cloud<D>(target: &mut D, origin: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let style = PrimitiveStyle::with_fill(CLOUD_COLOR);
    Circle::new(origin + Point::new(3, 8), 14)
        .into_styled(style)
        .draw(target)?;
    Circle::new(origin + Point::new(11, 3), 18)
        .into_styled(style)
        .draw(target)?;
    Rectangle::new(origin + Point::new(8, 14), Size::new(20, 8))
        .into_styled(style)
        .draw(target)
}

fn draw_weather_icon<D>(target: &mut D, origin: Point, icon: WeatherIcon) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    match icon {
        WeatherIcon::Clear => Circle::new(origin + Point::new(6, 6), 20)
            .into_styled(PrimitiveStyle::with_fill(SUN_COLOR))
            .draw(target),
        WeatherIcon::Clouds => draw_cloud(target, origin),
        WeatherIcon::Rain => {
            draw_cloud(target, origin)?;
            let style = PrimitiveStyle::with_stroke(RAIN_COLOR, 2);
            for x in [10, 17, 24] {
                Line::new(origin + Point::new(x, 24), origin + Point::new(x - 3, 31))
                    .into_styled(style)
                    .draw(target)?;
            }
            Ok(())
        }
        WeatherIcon::Thunderstorm => {
            draw_cloud(target, origin)?;
            let bolt = [
                origin + Point::new(18, 20),
                origin + Point::new(13, 26),
                origin + Point::new(19, 26),
                origin + Point::new(14, 31),
            ];
            Polyline::new(&bolt)
                .into_styled(PrimitiveStyle::with_stroke(SUN_COLOR, 2))
                .draw(target)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LCD_H, LCD_W};
    use crate::ui::Surface;
    use core::convert::Infallible;

    /// Host framebuffer for the 240x240 panel
    struct FrameBuffer {
        pixels: Vec<Rgb565>,
        writes: usize,
    }

    impl FrameBuffer {
        fn new() -> Self {
            Self {
                pixels: vec![Rgb565::RED; LCD_W as usize * LCD_H as usize],
                writes: 0,
            }
        }

        fn count_in(&self, bounds: Bounds, color: Rgb565) -> usize {
            let area = rectangle(bounds);
            area.points()
                .filter(|p| self.pixels[p.y as usize * LCD_W as usize + p.x as usize] == color)
                .count()
        }
    }

    impl OriginDimensions for FrameBuffer {
        fn size(&self) -> Size {
            Size::new(LCD_W as u32, LCD_H as u32)
        }
    }

    impl DrawTarget for FrameBuffer {
        type Color = Rgb565;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            for Pixel(p, color) in pixels {
                if p.x >= 0 && p.y >= 0 && p.x < LCD_W as i32 && p.y < LCD_H as i32 {
                    self.pixels[p.y as usize * LCD_W as usize + p.x as usize] = color;
                    self.writes += 1;
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_first_paint_covers_panel() {
        let mut layers = FaceLayers::new();
        let mut fb = FrameBuffer::new();
        paint(&mut layers, &mut fb).unwrap();

        assert_eq!(fb.count_in(layout::STATUS_BAR, Rgb565::RED), 0);
        assert!(fb.count_in(LayerId::Time.bounds(), TEXT_COLOR) > 0);
        assert!(layers.dirty().is_empty());
    }

    #[test]
    fn test_battery_bar_width() {
        let mut layers = FaceLayers::new();
        let mut fb = FrameBuffer::new();
        paint(&mut layers, &mut fb).unwrap();

        layers.set_battery_bar(6);
        paint(&mut layers, &mut fb).unwrap();

        let (_, _, _, h) = LayerId::BatteryMeter.bounds();
        assert_eq!(
            fb.count_in(LayerId::BatteryMeter.bounds(), METER_COLOR),
            6 * h as usize
        );
    }

    #[test]
    fn test_hidden_alert_is_blank() {
        let mut layers = FaceLayers::new();
        let mut fb = FrameBuffer::new();
        paint(&mut layers, &mut fb).unwrap();
        assert!(fb.count_in(LayerId::Alert.bounds(), TEXT_COLOR) > 0);

        layers.set_hidden(LayerId::Alert, true);
        paint(&mut layers, &mut fb).unwrap();
        assert_eq!(fb.count_in(LayerId::Alert.bounds(), TEXT_COLOR), 0);
    }

    #[test]
    fn test_text_stays_inside_layer() {
        let mut layers = FaceLayers::new();
        let mut fb = FrameBuffer::new();
        paint(&mut layers, &mut fb).unwrap();

        layers.set_text(LayerId::Weather, "WWWWWWWWWWWWWWWWWWWWWWWWWWWWWW");
        paint(&mut layers, &mut fb).unwrap();

        // Icon area to the right of the weather line keeps the icon colors
        assert_eq!(fb.count_in(LayerId::WeatherIcon.bounds(), TEXT_COLOR), 0);
    }

    #[test]
    fn test_clean_layers_are_not_redrawn() {
        let mut layers = FaceLayers::new();
        let mut fb = FrameBuffer::new();
        paint(&mut layers, &mut fb).unwrap();

        fb.writes = 0;
        paint(&mut layers, &mut fb).unwrap();
        assert_eq!(fb.writes, 0);
    }

    #[test]
    fn test_weather_icons_differ() {
        let mut counts = Vec::new();
        for icon in [
            WeatherIcon::Clear,
            WeatherIcon::Rain,
            WeatherIcon::Thunderstorm,
            WeatherIcon::Clouds,
        ] {
            let mut layers = FaceLayers::new();
            let mut fb = FrameBuffer::new();
            layers.set_weather("", icon);
            paint(&mut layers, &mut fb).unwrap();
            counts.push((
                fb.count_in(LayerId::WeatherIcon.bounds(), SUN_COLOR),
                fb.count_in(LayerId::WeatherIcon.bounds(), RAIN_COLOR),
                fb.count_in(LayerId::WeatherIcon.bounds(), CLOUD_COLOR),
            ));
        }

        // Clear: sun only. Rain: cloud and drops. Thunderstorm: cloud and bolt.
        assert!(counts[0].0 > 0 && counts[0].2 == 0);
        assert!(counts[1].1 > 0 && counts[1].2 > 0);
        assert!(counts[2].0 > 0 && counts[2].2 > 0);
        assert!(counts[3].0 == 0 && counts[3].1 == 0 && counts[3].2 > 0);
    }
}
