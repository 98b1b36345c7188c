use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("serial port {port} not found (available: {})", display_ports(.available))]
    PortNotFound {
        port: String,
        available: Vec<String>,
    },

    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(#[source] serialport::Error),

    #[error("failed to spawn trigger listener thread: {0}")]
    Spawn(#[from] std::io::Error),
}

fn display_ports(ports: &[String]) -> String {
    if ports.is_empty() {
        "none".to_string()
    } else {
        ports.join(", ")
    }
}

pub type Result<T> = std::result::Result<T, TriggerError>;
