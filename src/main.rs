//! # reviewqr CLI
//!
//! Command-line interface for the review QR wizard.
//!
//! ## Usage
//!
//! ```bash
//! # Run the wizard in a browser
//! GOOGLE_MAPS_API_KEY=... reviewqr serve --listen 0.0.0.0:8080
//!
//! # Render a QR block for a known place id
//! reviewqr render --place-id ChIJN1t_tDeuEmsRUsoyG83frY4 --template "Blue Theme" \
//!     --caption "Visit Us" --png qrcode.png
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use reviewqr::{
    error::ReviewQrError,
    export,
    qr::{self, Captions, MAX_SCALE, QrComposition},
    server::{self, ServerConfig},
    templates::{self, QrTemplate},
};

/// reviewqr - QR codes that open your Google review form
#[derive(Parser, Debug)]
#[command(name = "reviewqr")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server with the wizard frontend
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,

        /// Google Maps API key (search stays disabled without one)
        #[arg(long, env = "GOOGLE_MAPS_API_KEY", default_value = "", hide_env_values = true)]
        api_key: String,

        /// Maps web-service host
        #[arg(long, default_value = reviewqr::business::google::DEFAULT_BASE_URL)]
        maps_base_url: String,

        /// Integer pixel scale for previews and downloads
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=MAX_SCALE as i64))]
        scale: u32,
    },

    /// Render a QR block for a place id without the wizard
    Render {
        /// Place identifier to encode
        #[arg(long)]
        place_id: String,

        /// Template id or name (defaults to the Default template)
        #[arg(long)]
        template: Option<String>,

        /// First caption line
        #[arg(long, default_value = "")]
        caption: String,

        /// Second caption line
        #[arg(long, default_value = "")]
        caption2: String,

        /// Output PNG file
        #[arg(long, value_name = "FILE", default_value = export::EXPORT_FILENAME)]
        png: PathBuf,

        /// Integer pixel scale
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=MAX_SCALE as i64))]
        scale: u32,
    },

    /// List built-in templates
    Templates,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), ReviewQrError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            listen,
            api_key,
            maps_base_url,
            scale,
        } => {
            let config = ServerConfig {
                listen_addr: listen,
                api_key,
                maps_base_url,
                render_scale: scale,
            };

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(config))
        }

        Commands::Render {
            place_id,
            template,
            caption,
            caption2,
            png,
            scale,
        } => {
            let template = match template.as_deref() {
                Some(key) => find_template(key)?,
                None => templates::default_template(),
            };

            let composition =
                QrComposition::new(&place_id, template, Captions::new(&caption, &caption2));
            let block = qr::render(&composition, scale)?;
            let bytes = export::encode_png(&block)?;
            std::fs::write(&png, bytes)?;

            println!(
                "Saved {} ({}x{}, {}) encoding {}",
                png.display(),
                block.layout().width,
                block.layout().height,
                template.name,
                composition.payload()
            );
            Ok(())
        }

        Commands::Templates => {
            println!("Available templates:");
            for t in templates::all() {
                println!("  {:>2}  {:<14} {}", t.id, t.name, t.qr_color.hex());
            }
            Ok(())
        }
    }
}

/// Look up a template by numeric id, then by name.
fn find_template(key: &str) -> Result<&'static QrTemplate, ReviewQrError> {
    key.parse::<u32>()
        .ok()
        .and_then(templates::by_id)
        .or_else(|| templates::by_name(key))
        .ok_or_else(|| {
            let names: Vec<&str> = templates::all().iter().map(|t| t.name).collect();
            ReviewQrError::PreconditionNotMet(format!(
                "Unknown template '{}'. Available: {}",
                key,
                names.join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_range_enforced() {
        for args in [
            ["reviewqr", "render", "--place-id", "P1", "--scale", "17"],
            ["reviewqr", "render", "--place-id", "P1", "--scale", "0"],
            ["reviewqr", "serve", "--api-key", "k", "--scale", "100000"],
        ] {
            assert!(Cli::try_parse_from(args).is_err(), "{:?}", args);
        }

        let cli = Cli::try_parse_from(["reviewqr", "render", "--place-id", "P1", "--scale", "16"]).unwrap();
        assert!(matches!(cli.command, Commands::Render { scale: 16, .. }));
    }

    #[test]
    fn test_render_without_template_uses_default() {
        let cli = Cli::try_parse_from(["reviewqr", "render", "--place-id", "P1"]).unwrap();
        let Commands::Render { template, scale, .. } = cli.command else {
            panic!("expected render");
        };
        assert_eq!(template, None);
        assert_eq!(scale, 1);
    }

    #[test]
    fn test_find_template_by_id_or_name() {
        assert_eq!(find_template("2").unwrap().name, "Blue Theme");
        assert_eq!(find_template("red theme").unwrap().id, 4);
        assert!(matches!(find_template("Gold"), Err(ReviewQrError::PreconditionNotMet(_))));
    }
}
