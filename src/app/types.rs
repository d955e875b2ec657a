use crate::validation::FieldId;
use std::fmt;
use std::str::FromStr;

/// Component lifecycle states
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Failed,
}

/// System shutdown reason
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownReason {
    Signal(String),
    Error(String),
    UserRequest,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Signal(signal) => write!(f, "signal {}", signal),
            ShutdownReason::Error(error) => write!(f, "error: {}", error),
            ShutdownReason::UserRequest => f.write_str("user request"),
        }
    }
}

/// Visitor and operator actions accepted by the kiosk runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KioskCommand {
    Capture,
    TimedCapture,
    SwitchCamera,
    SetField(FieldId, String),
    BlurField(FieldId),
    SubmitDetails,
    CancelDetails,
    /// "Scan another" on success, "Try again" on error
    Again,
    Reset,
    Status,
    Quit,
}

impl FromStr for KioskCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let mut parts = line.splitn(3, char::is_whitespace);
        let verb = parts.next().unwrap_or_default().to_ascii_lowercase();

        let command = match verb.as_str() {
            "capture" | "c" => KioskCommand::Capture,
            "timed" | "t" => KioskCommand::TimedCapture,
            "switch" => KioskCommand::SwitchCamera,
            "set" => {
                let field = parts
                    .next()
                    .ok_or_else(|| "Usage: set <field> <value>".to_string())?
                    .parse::<FieldId>()?;
                let value = parts.next().unwrap_or_default().to_string();
                KioskCommand::SetField(field, value)
            }
            "blur" => {
                let field = parts
                    .next()
                    .ok_or_else(|| "Usage: blur <field>".to_string())?
                    .parse::<FieldId>()?;
                KioskCommand::BlurField(field)
            }
            "submit" => KioskCommand::SubmitDetails,
            "cancel" => KioskCommand::CancelDetails,
            "again" => KioskCommand::Again,
            "reset" => KioskCommand::Reset,
            "status" => KioskCommand::Status,
            "quit" | "exit" | "q" => KioskCommand::Quit,
            "" => return Err("Empty command".to_string()),
            other => return Err(format!("Unknown command: {}", other)),
        };

        Ok(command)
    }
}

/// One-line help shown on the console
pub const CONSOLE_HELP: &str = "Commands: capture | timed | switch | set <field> <value> | \
blur <field> | submit | cancel | again | reset | status | quit";
