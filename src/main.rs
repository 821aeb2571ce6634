use anyhow::Context;
use clap::{Parser, Subcommand};
use std::time::Duration;
use telemetry_link::link::list_ports;
use telemetry_link::util::encode_wire;
use telemetry_link::{
    init_logger, log_info, BaudRate, Frame, MonitorConfig, NegotiationConfig, SerialConfig,
    TelemetryError, TelemetryMonitor,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser)]
#[command(name = "telemetry-cli")]
#[command(about = "Decode framed ASCII-hex telemetry from a serial sensor board")]
struct Cli {
    /// Serial port; auto-detected when omitted
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// Fixed baud rate; negotiated when omitted
    #[arg(short, long, global = true)]
    baudrate: Option<u32>,

    /// Probe window per baud candidate, in milliseconds
    #[arg(long, default_value = "2000", global = true)]
    window_ms: u64,

    /// Upper bound of a single serial read, in milliseconds
    #[arg(long, default_value = "100", global = true)]
    read_timeout_ms: u64,

    /// Print readings as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect port and baud rate, then print readings until Ctrl-C
    Monitor,
    /// List serial ports with their descriptions
    ListPorts,
    /// Only negotiate the baud rate
    DetectBaud,
    /// Print the wire form of a frame
    Encode {
        device_type: u8,
        device_id: u8,
        query: u8,
        data: u8,
    },
}

impl Cli {
    fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            port: self.port.clone(),
            baudrate: self.baudrate,
            serial: SerialConfig {
                read_timeout: Duration::from_millis(self.read_timeout_ms),
            },
            negotiation: NegotiationConfig {
                window: Duration::from_millis(self.window_ms),
                read_timeout: Duration::from_millis(self.read_timeout_ms),
                candidates: BaudRate::ALL_RATES.to_vec(),
            },
            ..Default::default()
        }
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; never resolve
        std::future::pending::<()>().await;
    }
}

/// Ask the operator for a port name on stdin
async fn prompt_port() -> anyhow::Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"Enter the port manually (e.g. COM3 or /dev/ttyACM0): ")
        .await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("reading port from stdin")?;
    let port = line.trim();
    Ok((!port.is_empty()).then(|| port.to_string()))
}

async fn resolve_port(monitor: &TelemetryMonitor) -> anyhow::Result<String> {
    if let Some(port) = monitor.resolve_port()? {
        return Ok(port);
    }
    log_info("Could not detect the serial port automatically");
    prompt_port()
        .await?
        .ok_or(TelemetryError::PortNotFound)
        .context("no port entered")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();
    let monitor = TelemetryMonitor::new(cli.monitor_config())?;

    match cli.command.as_ref().unwrap_or(&Commands::Monitor) {
        Commands::Monitor => {
            let port = resolve_port(&monitor).await?;
            let mut factory = monitor.serial_factory(&port);
            let json = cli.json;
            let report = monitor
                .run(&mut factory, shutdown_signal(), |reading| {
                    if json {
                        match serde_json::to_string(reading) {
                            Ok(line) => println!("{line}"),
                            Err(e) => log::warn!("Could not serialize reading: {e}"),
                        }
                    } else {
                        println!("{reading}");
                    }
                })
                .await
                .with_context(|| format!("telemetry session on {port} failed"))?;
            log_info(&format!(
                "{} readings at {} baud",
                report.stats.readings(),
                report.baudrate
            ));
        }
        Commands::ListPorts => {
            for port in list_ports()? {
                println!("{} - {}", port.port_name, port.description);
            }
        }
        Commands::DetectBaud => {
            let port = resolve_port(&monitor).await?;
            let mut factory = monitor.serial_factory(&port);
            let rate = monitor
                .detect_baud(&mut factory, shutdown_signal())
                .await
                .with_context(|| format!("baud detection on {port} failed"))?;
            println!("{rate}");
        }
        Commands::Encode {
            device_type,
            device_id,
            query,
            data,
        } => {
            let frame = Frame::build(*device_type, *device_id, *query, *data);
            println!("{}", encode_wire(frame.as_bytes()).trim_end());
        }
    }

    Ok(())
}
