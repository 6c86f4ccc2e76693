use clap::{Parser, Subcommand};
use fbsend::fastboot::{ClassProfile, DeviceId, FASTBOOT, REBOOT_BOOTLOADER};
use fbsend::os::linux::enumerate::{find, USB_NAMESPACE};
use fbsend::transport::Termination;
use fbsend::Error;
use log::LevelFilter;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "fbsend", about = "Send a command to a fastboot device over Linux usbfs")]
struct Cli {
    /// Vendor id to match (hex)
    #[arg(long, default_value = "0bb4", value_parser = parse_hex16)]
    vendor_id: u16,

    /// Product id to match (hex)
    #[arg(long, default_value = "0fff", value_parser = parse_hex16)]
    product_id: u16,

    /// Per-transaction bulk timeout in milliseconds, 0 waits forever
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u32,

    /// usbfs namespace to scan
    #[arg(long, default_value = USB_NAMESPACE)]
    usb_path: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Locate the device and send a command over its bulk-out endpoint
    Send {
        /// Command text to transmit
        #[arg(default_value = REBOOT_BOOTLOADER)]
        payload: String,

        /// Append a terminating zero-length packet after the payload
        #[arg(long)]
        zlp: bool,
    },
    /// Locate the device and print where it was found
    Probe,
}

fn parse_hex16(arg: &str) -> Result<u16, String> {
    let digits = arg.trim_start_matches("0x");
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid hex id {:?}: {}", arg, e))
}

fn main() {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    simple_logger::SimpleLogger::new().with_level(level).init().ok();
    process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    let profile = ClassProfile {
        id: DeviceId {
            vendor: cli.vendor_id,
            product: cli.product_id,
        },
        ..FASTBOOT
    };

    let timeout = Duration::from_millis(u64::from(cli.timeout_ms));
    let mut device = match find(&cli.usb_path, &profile, timeout) {
        Ok(device) => device,
        Err(e) => {
            log::error!("discovery failed: {}", e);
            return match e {
                Error::DeviceNotFound(_) => 2,
                _ => 1,
            };
        }
    };

    match cli.command {
        Command::Probe => {
            println!("{} at {}", profile.id, device);
            0
        }
        Command::Send { payload, zlp } => {
            let termination = if zlp {
                Termination::ZeroLengthPacket
            } else {
                Termination::None
            };
            match device.send(payload.as_bytes(), termination) {
                Ok(n) => {
                    log::info!("sent {} bytes to {}", n, device);
                    0
                }
                Err(e) => {
                    log::error!("transport failed: {}", e);
                    1
                }
            }
        }
    }
}
