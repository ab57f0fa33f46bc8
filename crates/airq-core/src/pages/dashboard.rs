use core::fmt::Write;

use chrono::{DateTime, Local};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_10X20};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use heapless::String;

use super::constants::*;
use super::{PageKind, page_index};
use crate::framebuffer::MonoFrame;
use crate::metrics::{Indicators, Status, Trend};
use crate::sample::Field;
use crate::state::RenderView;

/// Default absolute change below which a trend is flat
pub const DEFAULT_TREND_THRESHOLD: f32 = 5.0;

const SMALL: MonoTextStyle<'static, BinaryColor> = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
const LARGE: MonoTextStyle<'static, BinaryColor> =
    MonoTextStyle::new(&FONT_10X20, BinaryColor::On);

const LARGE_CHAR_WIDTH_PX: i32 = 10;

/// Draws the rotating pages for a [`RenderView`].
///
/// Every frame has the same header (temperature, time of the reading,
/// humidity) followed by the page body. Each field row shows a label, the
/// value with its unit, a trend arrow against the recent mean and a gauge
/// bar.
pub struct Dashboard {
    size: Size,
    pages: &'static [PageKind],
    page_seconds: u32,
    trend_threshold: f32,
    indicators: Indicators,
}

impl Dashboard {
    pub fn new(size: Size, pages: &'static [PageKind], page_seconds: u32) -> Self {
        Self {
            size,
            pages,
            page_seconds,
            trend_threshold: DEFAULT_TREND_THRESHOLD,
            indicators: Indicators::default(),
        }
    }

    pub fn with_trend_threshold(mut self, threshold: f32) -> Self {
        self.trend_threshold = threshold;
        self
    }

    pub fn with_indicators(mut self, indicators: Indicators) -> Self {
        self.indicators = indicators;
        self
    }

    pub fn pages(&self) -> &'static [PageKind] {
        self.pages
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Index into [`Dashboard::pages`] of the page shown at `now_secs`.
    pub fn page_at(&self, now_secs: f64) -> usize {
        page_index(now_secs, self.page_seconds, self.pages.len())
    }

    /// Draw page `page` for `view` into a fresh frame.
    pub fn render(&self, view: &RenderView, page: usize) -> MonoFrame {
        let mut frame = MonoFrame::new(self.size);
        let Ok(()) = self.draw(&mut frame, view, page);
        frame
    }

    /// Draw page `page` for `view` onto any monochrome target.
    pub fn draw<D>(&self, target: &mut D, view: &RenderView, page: usize) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        self.draw_header(target, view)?;

        let Some(&kind) = self.pages.get(page) else {
            return Ok(());
        };

        Text::with_baseline(
            kind.title(),
            Point::new(MARGIN_PX, TITLE_TOP_PX),
            SMALL,
            Baseline::Top,
        )
        .draw(target)?;

        let mut advisory = false;
        for (row, &field) in kind.fields().iter().enumerate() {
            let top = FIELD_ROWS_TOP_PX + row as i32 * FIELD_ROW_HEIGHT_PX;
            let value = field.of(&view.sample);
            self.draw_field(target, top, field, value, view.baseline(field))?;

            if let Some(value) = value {
                advisory |=
                    raises_advisory(field) && self.indicators.status(field, value) == Status::Bad;
            }
        }

        if advisory {
            self.draw_advisory(target)?;
        }
        Ok(())
    }

    fn draw_header<D>(&self, target: &mut D, view: &RenderView) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let width = self.size.width as i32;
        let sample = &view.sample;
        let top = |alignment| {
            TextStyleBuilder::new()
                .alignment(alignment)
                .baseline(Baseline::Top)
                .build()
        };

        let mut text: String<16> = String::new();
        let _ = write!(text, "{:.1}C", sample.temperature);
        Text::with_text_style(&text, Point::new(MARGIN_PX, 1), SMALL, top(Alignment::Left))
            .draw(target)?;

        text.clear();
        if let Some(time) = DateTime::from_timestamp(sample.timestamp as i64, 0) {
            let _ = write!(text, "{}", time.with_timezone(&Local).format("%H:%M"));
        }
        Text::with_text_style(&text, Point::new(width / 2, 1), SMALL, top(Alignment::Center))
            .draw(target)?;

        text.clear();
        let _ = write!(text, "{:.0}%", sample.humidity);
        Text::with_text_style(
            &text,
            Point::new(width - MARGIN_PX, 1),
            SMALL,
            top(Alignment::Right),
        )
        .draw(target)?;

        Line::new(
            Point::new(0, HEADER_HEIGHT_PX - 1),
            Point::new(width - 1, HEADER_HEIGHT_PX - 1),
        )
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(target)?;

        Ok(())
    }

    fn draw_field<D>(
        &self,
        target: &mut D,
        top: i32,
        field: Field,
        value: Option<f32>,
        baseline: Option<f32>,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let width = self.size.width as i32;

        Text::with_baseline(field.label(), Point::new(MARGIN_PX, top), SMALL, Baseline::Top)
            .draw(target)?;

        let mut text: String<16> = String::new();
        match value {
            Some(v) => {
                let _ = write!(text, "{:.*}", field.decimals(), v);
            }
            None => {
                let _ = text.push_str("--");
            }
        }
        let value_top = top + VALUE_OFFSET_PX;
        Text::with_baseline(&text, Point::new(MARGIN_PX, value_top), LARGE, Baseline::Top)
            .draw(target)?;

        let unit_x = MARGIN_PX + text.len() as i32 * LARGE_CHAR_WIDTH_PX + 2;
        Text::with_baseline(
            field.unit(),
            Point::new(unit_x, value_top + 8),
            SMALL,
            Baseline::Top,
        )
        .draw(target)?;

        if let (Some(current), Some(baseline)) = (value, baseline) {
            let trend = Trend::classify(current, baseline, self.trend_threshold);
            let origin = Point::new(width - MARGIN_PX - ARROW_SIZE_PX, top + ARROW_OFFSET_PX);
            draw_trend_arrow(target, origin, trend)?;
        }

        let fraction = value.map_or(0.0, |v| self.indicators.get(field).gauge_fraction(v));
        draw_gauge(
            target,
            Point::new(MARGIN_PX, top + GAUGE_OFFSET_PX),
            (width - 2 * MARGIN_PX).max(2) as u32,
            fraction,
        )
    }

    fn draw_advisory<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let top = self.size.height.saturating_sub(ADVISORY_HEIGHT_PX) as i32;
        Rectangle::new(
            Point::new(0, top),
            Size::new(self.size.width, ADVISORY_HEIGHT_PX),
        )
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(target)?;

        let inverted = MonoTextStyle::new(&FONT_6X10, BinaryColor::Off);
        let style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Top)
            .build();
        Text::with_text_style(
            ADVISORY_TEXT,
            Point::new(self.size.width as i32 / 2, top + 2),
            inverted,
            style,
        )
        .draw(target)?;

        Ok(())
    }
}

/// Comfort fields never raise the ventilation advisory.
const fn raises_advisory(field: Field) -> bool {
    !matches!(field, Field::Temperature | Field::Humidity)
}

/// Arrow in a square of [`ARROW_SIZE_PX`], `origin` at its left middle.
fn draw_trend_arrow<D>(target: &mut D, origin: Point, trend: Trend) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let half = ARROW_SIZE_PX / 2;
    let head = 3;
    let segments: [(Point, Point); 3] = match trend {
        Trend::Flat => {
            let tip = Point::new(ARROW_SIZE_PX, 0);
            [
                (Point::zero(), tip),
                (Point::new(ARROW_SIZE_PX - head, -head), tip),
                (Point::new(ARROW_SIZE_PX - head, head), tip),
            ]
        }
        Trend::Rising | Trend::Falling => {
            let dir = if trend == Trend::Rising { -1 } else { 1 };
            let tip = Point::new(half, dir * half);
            [
                (Point::new(half, -half), Point::new(half, half)),
                (Point::new(half - head, dir * (half - head)), tip),
                (Point::new(half + head, dir * (half - head)), tip),
            ]
        }
    };

    let style = PrimitiveStyle::with_stroke(BinaryColor::On, 1);
    for (start, end) in segments {
        Line::new(origin + start, origin + end)
            .into_styled(style)
            .draw(target)?;
    }
    Ok(())
}

/// Outlined bar filled to `fraction` of its inner width.
fn draw_gauge<D>(target: &mut D, top_left: Point, width: u32, fraction: f32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    Rectangle::new(top_left, Size::new(width, GAUGE_HEIGHT_PX))
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(target)?;

    let inner = width.saturating_sub(2);
    let fill = (fraction.clamp(0.0, 1.0) * inner as f32) as u32;
    if fill > 0 {
        Rectangle::new(
            top_left + Point::new(1, 1),
            Size::new(fill, GAUGE_HEIGHT_PX - 2),
        )
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(target)?;
    }
    Ok(())
}
