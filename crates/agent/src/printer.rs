//! Ticket printing for 80mm ESC/POS thermal printers.
//!
//! A ticket is first laid out as styled lines from the template, then
//! encoded to printer bytes or to plain text for the log.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use qdesk_core::ticket::{
    TicketData, TicketTemplate, DEFAULT_FOOTER_1, DEFAULT_FOOTER_2, DEFAULT_HEADER, DEFAULT_THANKS,
    DEFAULT_TITLE,
};

/// Printing failed; the message becomes the job's failure reason.
#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    #[error("printer {device} unavailable: {source}")]
    Device {
        device: String,
        #[source]
        source: std::io::Error,
    },

    #[error("print task aborted: {0}")]
    Aborted(String),
}

/// The printing collaborator. Called from a blocking thread.
pub trait TicketPrinter: Send + Sync {
    fn print(&self, data: &TicketData, template: &TicketTemplate) -> Result<(), PrintError>;
}

const ESC: u8 = 0x1b;
const GS: u8 = 0x1d;

const INIT: [u8; 2] = [ESC, b'@'];
const ALIGN_CENTER: [u8; 3] = [ESC, b'a', 1];
const BOLD_ON: [u8; 3] = [ESC, b'E', 1];
const BOLD_OFF: [u8; 3] = [ESC, b'E', 0];
const DOUBLE_ON: [u8; 3] = [GS, b'!', 0x11];
const DOUBLE_OFF: [u8; 3] = [GS, b'!', 0x00];
const FONT_B: [u8; 3] = [ESC, b'M', 1];
const FONT_A: [u8; 3] = [ESC, b'M', 0];
const FEED_LINE: [u8; 3] = [ESC, b'd', 1];
const FEED_TAIL: [u8; 3] = [ESC, b'd', 3];
const CUT: [u8; 4] = [GS, b'V', 66, 3];

/// Width of the separator rule in characters.
pub const RULE_WIDTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// Bold, normal size.
    Bold,
    /// Condensed font.
    Small,
    /// Double width and height, bold.
    Number,
    /// Dashed separator.
    Rule,
    /// One line of paper feed.
    Feed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketLine {
    pub style: LineStyle,
    pub text: String,
}

impl TicketLine {
    fn new(style: LineStyle, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
        }
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

/// Lay out a ticket. Empty template texts fall back to the defaults.
pub fn layout_ticket(data: &TicketData, template: &TicketTemplate) -> Vec<TicketLine> {
    use LineStyle::*;

    let mut lines = vec![TicketLine::new(Bold, or_default(&template.header, DEFAULT_HEADER))];

    if template.show_subheader && !template.subheader.trim().is_empty() {
        lines.push(TicketLine::new(Small, template.subheader.as_str()));
    }

    lines.push(TicketLine::new(Rule, ""));
    lines.push(TicketLine::new(Small, or_default(&template.title, DEFAULT_TITLE)));
    lines.push(TicketLine::new(Feed, ""));
    lines.push(TicketLine::new(Number, data.queue_number.as_str()));

    if template.show_type {
        lines.push(TicketLine::new(Feed, ""));
        lines.push(TicketLine::new(Bold, data.type_name.as_str()));
    }

    lines.push(TicketLine::new(Rule, ""));

    if template.show_datetime {
        lines.push(TicketLine::new(Small, data.date_time.as_str()));
    }

    if template.show_footer {
        lines.push(TicketLine::new(Rule, ""));
        lines.push(TicketLine::new(Small, or_default(&template.footer1, DEFAULT_FOOTER_1)));
        lines.push(TicketLine::new(Small, or_default(&template.footer2, DEFAULT_FOOTER_2)));
    }

    if template.show_thanks {
        lines.push(TicketLine::new(Feed, ""));
        lines.push(TicketLine::new(Small, or_default(&template.thanks, DEFAULT_THANKS)));
    }

    lines
}

/// Encode laid-out lines as ESC/POS, ending with a feed and a partial cut.
pub fn encode_escpos(lines: &[TicketLine]) -> Vec<u8> {
    let mut out = Vec::with_capacity(256);
    out.extend_from_slice(&INIT);
    out.extend_from_slice(&ALIGN_CENTER);

    for line in lines {
        match line.style {
            LineStyle::Bold => {
                out.extend_from_slice(&BOLD_ON);
                push_text(&mut out, &line.text);
                out.extend_from_slice(&BOLD_OFF);
            }
            LineStyle::Small => {
                out.extend_from_slice(&FONT_B);
                push_text(&mut out, &line.text);
                out.extend_from_slice(&FONT_A);
            }
            LineStyle::Number => {
                out.extend_from_slice(&DOUBLE_ON);
                out.extend_from_slice(&BOLD_ON);
                push_text(&mut out, &line.text);
                out.extend_from_slice(&BOLD_OFF);
                out.extend_from_slice(&DOUBLE_OFF);
            }
            LineStyle::Rule => push_text(&mut out, &"-".repeat(RULE_WIDTH)),
            LineStyle::Feed => out.extend_from_slice(&FEED_LINE),
        }
    }

    out.extend_from_slice(&FEED_TAIL);
    out.extend_from_slice(&CUT);
    out
}

fn push_text(out: &mut Vec<u8>, text: &str) {
    out.extend_from_slice(text.as_bytes());
    out.push(b'\n');
}

/// Render laid-out lines as centred plain text.
pub fn render_text(lines: &[TicketLine]) -> String {
    lines
        .iter()
        .map(|line| match line.style {
            LineStyle::Rule => "-".repeat(RULE_WIDTH),
            LineStyle::Feed => String::new(),
            _ => format!("{:^width$}", line.text, width = RULE_WIDTH),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes ESC/POS bytes to a raw device node such as `/dev/usb/lp0`.
pub struct DevicePrinter {
    name: String,
    device: PathBuf,
}

impl DevicePrinter {
    pub fn new(name: impl Into<String>, device: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            device: device.into(),
        }
    }
}

impl TicketPrinter for DevicePrinter {
    fn print(&self, data: &TicketData, template: &TicketTemplate) -> Result<(), PrintError> {
        let bytes = encode_escpos(&layout_ticket(data, template));
        let device_err = |source| PrintError::Device {
            device: self.device.display().to_string(),
            source,
        };

        let mut device = OpenOptions::new()
            .write(true)
            .open(&self.device)
            .map_err(device_err)?;
        device.write_all(&bytes).map_err(device_err)?;
        device.flush().map_err(device_err)?;

        tracing::debug!(
            printer = %self.name,
            queue_number = %data.queue_number,
            bytes = bytes.len(),
            "Ticket sent to printer",
        );
        Ok(())
    }
}

/// Logs the ticket instead of printing it. Used when no device is configured.
pub struct DryRunPrinter {
    name: String,
}

impl DryRunPrinter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TicketPrinter for DryRunPrinter {
    fn print(&self, data: &TicketData, template: &TicketTemplate) -> Result<(), PrintError> {
        let text = render_text(&layout_ticket(data, template));
        tracing::info!(
            printer = %self.name,
            queue_number = %data.queue_number,
            "Dry-run ticket:\n{text}",
        );
        Ok(())
    }
}
