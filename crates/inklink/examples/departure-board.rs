//! Departure board: draws a timetable and sends it to one display.
//!
//! Run with:
//!   cargo run --example departure-board -- /dev/ttyUSB0 2
//!
//! The display refreshes, then sleeps for an hour.

use std::time::{Duration, SystemTime};

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle};
use embedded_graphics::text::Text;
use inklink::link::connect;
use inklink::payload::Bitmap;
use inklink::transport::DEFAULT_BAUD_RATE;

const DEPARTURES: &[(&str, &str, &str)] = &[
    ("08:12", "S3", "Hauptbahnhof"),
    ("08:19", "U2", "Messe Nord"),
    ("08:24", "Bus 41", "Klinikum"),
    ("08:31", "S3", "Flughafen"),
];

fn draw_board(bitmap: &mut Bitmap) -> Result<(), core::convert::Infallible> {
    let title = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
    let row = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);

    Text::new("Departures", Point::new(12, 28), title).draw(bitmap)?;
    Line::new(Point::new(10, 38), Point::new(389, 38))
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 2))
        .draw(bitmap)?;

    for (i, (time, line, destination)) in DEPARTURES.iter().enumerate() {
        let y = 64 + i as i32 * 24;
        Text::new(time, Point::new(12, y), row).draw(bitmap)?;
        Text::new(line, Point::new(72, y), row).draw(bitmap)?;
        Text::new(destination, Point::new(140, y), row).draw(bitmap)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let port = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let device_id: u8 = args.next().as_deref().unwrap_or("1").parse()?;

    let mut bitmap = Bitmap::new();
    draw_board(&mut bitmap)?;
    eprintln!("drew {} ink pixels", bitmap.ink_count());

    let link = connect(&port, DEFAULT_BAUD_RATE)?;
    let wake = SystemTime::now() + Duration::from_secs(3600);
    let report = link
        .update_and_hibernate(&bitmap, device_id, wake, Duration::from_secs(10))
        .await?;

    eprintln!(
        "sent {} bytes in {} packets; display {} sleeps for {}s",
        report.image.bytes,
        report.image.packets,
        device_id,
        report.hibernation.seconds_until_wakeup
    );
    Ok(())
}
