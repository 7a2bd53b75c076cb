use clap::{Parser, Subcommand};
use lora_relay::beacon::{LogBeaconSink, MonotonicClock};
use lora_relay::config::{JsonFileStorage, MemoryStorage, Storage};
use lora_relay::constants::{DEFAULT_MODBUS_BAUDRATE, SCHEDULER_TICK_MS, XTAL_FREQ_HZ};
use lora_relay::logging::init_logger_with_filter;
use lora_relay::modbus::{ModbusLink, NullModbusLink, SerialConfig, SerialModbusLink};
use lora_relay::radio::{LoggingHal, Sx126xDriver};
use lora_relay::{log_info, run_console, run_scheduler, DeviceConfig, RelayError, RelayNode};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_serial::SerialPortBuilderExt;

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "LoRa-to-Modbus relay node with AT-command configuration")]
#[command(version)]
struct Cli {
    /// Debug-level logging unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Boot the node and serve AT commands until the console closes
    Run {
        /// Console serial port; stdin/stdout when omitted
        #[arg(long)]
        console: Option<String>,
        #[arg(long, default_value = "115200")]
        console_baud: u32,
        /// Modbus serial port
        #[arg(long)]
        modbus: Option<String>,
        /// Directory holding persisted settings; volatile when omitted
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Boot the node, run the given AT lines and print the replies
    Exec {
        #[arg(required = true)]
        lines: Vec<String>,
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Print the compiled defaults in AT+STATUS form
    Defaults,
}

fn open_storage(store: Option<PathBuf>) -> Box<dyn Storage> {
    match store {
        Some(dir) => Box::new(JsonFileStorage::new(dir)),
        None => Box::new(MemoryStorage::new()),
    }
}

fn host_radio() -> Sx126xDriver<LoggingHal> {
    Sx126xDriver::new(LoggingHal::new(), XTAL_FREQ_HZ)
}

async fn run(
    console: Option<String>,
    console_baud: u32,
    modbus: Option<String>,
    store: Option<PathBuf>,
) -> Result<(), RelayError> {
    let modbus: Box<dyn ModbusLink> = match modbus {
        Some(port) => Box::new(SerialModbusLink::open(&port, SerialConfig::default())?),
        None => Box::new(NullModbusLink::new(DEFAULT_MODBUS_BAUDRATE)),
    };
    let node = RelayNode::boot(
        host_radio(),
        open_storage(store),
        modbus,
        MonotonicClock::new(),
        LogBeaconSink,
    )?;
    let shared = Arc::new(Mutex::new(node));

    tokio::spawn(run_scheduler(
        shared.clone(),
        Duration::from_millis(SCHEDULER_TICK_MS),
    ));

    match console {
        Some(port) => {
            let stream = tokio_serial::new(&port, console_baud)
                .open_native_async()
                .map_err(|e| RelayError::SerialPort(e.to_string()))?;
            log_info(&format!("Console on {port} at {console_baud} baud"));
            let (reader, writer) = tokio::io::split(stream);
            run_console(shared, reader, writer).await
        }
        None => run_console(shared, tokio::io::stdin(), tokio::io::stdout()).await,
    }
}

fn exec(lines: &[String], store: Option<PathBuf>) -> Result<(), RelayError> {
    let mut node = RelayNode::boot(
        host_radio(),
        open_storage(store),
        NullModbusLink::new(DEFAULT_MODBUS_BAUDRATE),
        MonotonicClock::new(),
        LogBeaconSink,
    )?;
    for line in lines {
        println!("{}", node.handle_line(line));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), RelayError> {
    let cli = Cli::parse();
    init_logger_with_filter(if cli.verbose { "debug" } else { "info" });

    match cli.command {
        Commands::Run {
            console,
            console_baud,
            modbus,
            store,
        } => run(console, console_baud, modbus, store).await?,
        Commands::Exec { lines, store } => exec(&lines, store)?,
        Commands::Defaults => {
            for line in DeviceConfig::default().status_lines() {
                println!("{line}");
            }
        }
    }

    Ok(())
}
