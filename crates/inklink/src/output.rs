use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use inklink_frame::DeviceLine;
use inklink_link::TransmissionReport;
use inklink_payload::HibernationCommand;
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One line of command output.
#[derive(Debug, Default, Serialize)]
pub struct Record<'a> {
    pub event: &'a str,
    pub port: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packets: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_until_wakeup: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
    pub timestamp: u64,
}

impl<'a> Record<'a> {
    pub fn new(event: &'a str, port: &'a str) -> Self {
        Self {
            event,
            port,
            timestamp: now_unix_seconds(),
            ..Self::default()
        }
    }

    pub fn transmission(port: &'a str, report: &TransmissionReport) -> Self {
        Self {
            device_id: Some(report.device_id),
            bytes: Some(report.bytes),
            packets: Some(report.packets),
            ..Self::new("image-sent", port)
        }
    }

    pub fn hibernation(port: &'a str, device_id: u8, command: &HibernationCommand) -> Self {
        Self {
            device_id: Some(device_id),
            seconds_until_wakeup: Some(command.seconds_until_wakeup),
            ..Self::new("hibernation-sent", port)
        }
    }

    pub fn device_line(port: &'a str, line: &'a DeviceLine) -> Self {
        match line {
            DeviceLine::Control(name) => Self {
                signal: Some(name),
                ..Self::new("control", port)
            },
            DeviceLine::Log(text) => Self {
                text: Some(text),
                ..Self::new("log", port)
            },
        }
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("event", self.event.to_string()),
            ("port", self.port.to_string()),
        ];
        if let Some(device_id) = self.device_id {
            fields.push(("device", device_id.to_string()));
        }
        if let Some(bytes) = self.bytes {
            fields.push(("bytes", bytes.to_string()));
        }
        if let Some(packets) = self.packets {
            fields.push(("packets", packets.to_string()));
        }
        if let Some(seconds) = self.seconds_until_wakeup {
            fields.push(("wakeup_in", format!("{seconds}s")));
        }
        if let Some(signal) = self.signal {
            fields.push(("signal", signal.to_string()));
        }
        if let Some(text) = self.text {
            fields.push(("text", text.to_string()));
        }
        fields
    }
}

pub fn print_record(record: &Record<'_>, format: OutputFormat) {
    println!("{}", render(record, format));
}

fn render(record: &Record<'_>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string(record).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table => {
            let fields = record.fields();
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(fields.iter().map(|(name, _)| name.to_uppercase()))
                .add_row(fields.into_iter().map(|(_, value)| value));
            table.to_string()
        }
        OutputFormat::Pretty => record
            .fields()
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_omits_absent_fields() {
        let command = HibernationCommand::new(3661);
        let record = Record::hibernation("/dev/ttyUSB0", 2, &command);
        let value: serde_json::Value =
            serde_json::from_str(&render(&record, OutputFormat::Json)).expect("valid json");

        assert_eq!(value["event"], "hibernation-sent");
        assert_eq!(value["device_id"], 2);
        assert_eq!(value["seconds_until_wakeup"], 3661);
        assert!(value.get("bytes").is_none());
        assert!(value.get("text").is_none());
    }

    #[test]
    fn pretty_is_one_line() {
        let report = TransmissionReport {
            device_id: 7,
            bytes: 1002,
            packets: 4,
        };
        let line = render(
            &Record::transmission("/dev/ttyUSB0", &report),
            OutputFormat::Pretty,
        );

        assert_eq!(
            line,
            "event=image-sent port=/dev/ttyUSB0 device=7 bytes=1002 packets=4"
        );
    }

    #[test]
    fn device_lines_keep_their_kind() {
        let control = DeviceLine::Control("ACK".to_string());
        let log = DeviceLine::Log("battery 3.9V".to_string());

        let control = render(&Record::device_line("p", &control), OutputFormat::Pretty);
        let log = render(&Record::device_line("p", &log), OutputFormat::Table);

        assert!(control.contains("event=control"));
        assert!(control.contains("signal=ACK"));
        assert!(log.contains("battery 3.9V"));
        assert!(log.contains("TEXT"));
    }
}
