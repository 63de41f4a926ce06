use std::path::PathBuf;

use clap::{Parser, Subcommand};

use attendance_kiosk::api::{
    ApiClient, AttendanceRecord, AttendanceRecordsQuery, DEFAULT_SERVER_URL, SERVER_URL_ENV,
};
use attendance_kiosk::config::Config;

/// attendance-kiosk: camera check-in client for the attendance server
#[derive(Parser)]
#[command(name = "attendance-kiosk")]
#[command(version, about = "Camera check-in client for the attendance server")]
#[command(after_help = "EXAMPLES:
    # Run one check-in cycle against the default server
    attendance-kiosk checkin

    # Check in against a specific server
    attendance-kiosk checkin --server http://kiosk.local:5000

    # Show the recent attendance list
    attendance-kiosk records

    # List connected cameras (native-camera builds)
    attendance-kiosk list-cameras
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture one frame and submit it for recognition
    Checkin {
        /// Attendance server base URL (overrides env and config file)
        #[arg(short, long)]
        server: Option<String>,
        /// Path to a config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Fetch and print the recent attendance records
    Records {
        /// Attendance server base URL (overrides env and config file)
        #[arg(short, long)]
        server: Option<String>,
        /// Path to a config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List available camera devices
    ListCameras,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, String> {
    Config::load(path.map(|p| p.as_path())).map_err(|e| e.to_string())
}

/// Resolve the server base URL: flag, then environment, then config file.
fn resolve_server_url(flag: Option<String>, config: &Config) -> String {
    flag.or_else(|| std::env::var(SERVER_URL_ENV).ok())
        .or_else(|| config.server.base_url.clone())
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
}

fn build_client(server: Option<String>, config: &Config) -> Result<ApiClient, String> {
    let base_url = resolve_server_url(server, config);
    ApiClient::with_timeout(
        base_url,
        std::time::Duration::from_secs(config.server.timeout_secs),
    )
    .map_err(|e| e.to_string())
}

#[cfg(feature = "native-camera")]
async fn run_checkin(server: Option<String>, config_path: Option<PathBuf>) -> Result<(), String> {
    use attendance_kiosk::device::{DeviceSession, NativeCameraPlatform};
    use attendance_kiosk::workflow::{CaptureWorkflow, RecognitionOutcome, StatusEvent};

    let config = load_config(config_path.as_ref())?;
    let client = build_client(server, &config)?;
    println!("Server: {}", client.base_url());

    let mut session = DeviceSession::new(Box::new(NativeCameraPlatform::new(config.camera.device)))
        .with_constraints(config.camera.constraints())
        .with_jpeg_quality(config.capture.jpeg_quality);
    session.activate().map_err(|e| e.to_string())?;
    println!("Camera ready.");

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                StatusEvent::StatusChanged(status) => println!("  status: {}", status),
                StatusEvent::CycleFinished(_) => {}
                StatusEvent::RecordsRefreshed(records) => print_records(&records),
            }
        }
    });

    let outcome = {
        let workflow = CaptureWorkflow::new(session, &client, &client).with_status_sink(tx);
        let outcome = workflow
            .begin()
            .await
            .map_err(|e| e.to_string())?;
        workflow.deactivate_device();
        outcome
    };
    // Workflow (and with it the sink) is gone; drain the printer
    let _ = printer.await;

    println!("{}", outcome);
    match outcome {
        RecognitionOutcome::Identified { .. } => Ok(()),
        RecognitionOutcome::Rejected { .. } | RecognitionOutcome::Failed { .. } => {
            Err("check-in did not complete; reset and try again".to_string())
        }
    }
}

#[cfg(not(feature = "native-camera"))]
async fn run_checkin(_server: Option<String>, _config: Option<PathBuf>) -> Result<(), String> {
    Err(
        "this build has no camera backend; rebuild with `--features native-camera`"
            .to_string(),
    )
}

async fn run_records(server: Option<String>, config_path: Option<PathBuf>) -> Result<(), String> {
    let config = load_config(config_path.as_ref())?;
    let client = build_client(server, &config)?;

    let records = client.recent_records().await.map_err(|e| e.to_string())?;
    print_records(&records);
    Ok(())
}

fn print_records(records: &[AttendanceRecord]) {
    if records.is_empty() {
        println!("No attendance records.");
        return;
    }
    println!("Recent attendance:");
    for record in records {
        println!(
            "  {}  {} ({})  {}",
            record.timestamp, record.student_name, record.student_id, record.status
        );
    }
}

#[cfg(feature = "native-camera")]
fn run_list_cameras() -> Result<(), String> {
    let devices = attendance_kiosk::device::list_devices().map_err(|e| e.to_string())?;
    if devices.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }
    for device in devices {
        println!("{}", device);
    }
    Ok(())
}

#[cfg(not(feature = "native-camera"))]
fn run_list_cameras() -> Result<(), String> {
    Err(
        "this build has no camera backend; rebuild with `--features native-camera`"
            .to_string(),
    )
}

fn main() {
    // Load .env before anything reads the environment; missing files are fine
    let _ = dotenv::dotenv();

    let cli = Cli::parse();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Checkin { server, config } => rt.block_on(run_checkin(server, config)),
        Commands::Records { server, config } => rt.block_on(run_records(server, config)),
        Commands::ListCameras => run_list_cameras(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
