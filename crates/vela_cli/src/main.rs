use std::collections::HashSet;
use std::path::PathBuf;

use aws_config::BehaviorVersion;
use clap::{Parser, Subcommand};
use vela_core::prelude::WhatsNew;
use vela_release::{DevOptions, Platform, ReleaseOptions, build_dev_configs, run_release};
use vela_s3::S3Store;

#[derive(Parser)]
#[command(name = "vela")]
#[command(about = "Release manager for versioned client assets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Release changed assets to a bucket and publish/patch configs
    Release {
        /// Bucket holding published assets and configs
        bucket: String,

        /// Directory containing built assets
        asset_dir: PathBuf,

        /// Staging directory for minified assets
        output_dir: PathBuf,

        /// `major`, `minor`, `patch`, or an explicit `X.Y.Z`
        version: String,

        /// Update only assets with the given names. Otherwise, update all
        #[arg(long, value_delimiter = ',')]
        only: Option<Vec<String>>,

        /// AWS region
        #[arg(long, env = "VELA_REGION", default_value = "ca-central-1")]
        region: String,

        /// Push changed assets and only update configs which already exist
        #[arg(long)]
        no_new_config: bool,

        /// Changed assets are compatible with configs pinned one version back
        #[arg(long)]
        compatible: bool,

        /// English and French descriptions of the config changes
        #[arg(long, num_args = 2, value_names = ["EN", "FR"])]
        desc: Option<Vec<String>>,

        /// Minify command, invoked as `<CMD> <asset_dir> <output_dir>`
        #[arg(long)]
        minify: Option<String>,
    },
    /// Build dev configs pointing at local asset URLs; no store access
    Dev {
        /// Directory containing dev assets
        asset_dir: PathBuf,

        /// Output directory for the dev configs
        config_dir: PathBuf,

        /// Output config name, expanded per platform
        #[arg(default_value = "public.json")]
        config_name: String,

        /// iOS app bundle directory to refresh with assets and a base config
        #[arg(long)]
        ios: Option<PathBuf>,

        /// Android app bundle directory to refresh with assets and a base config
        #[arg(long)]
        android: Option<PathBuf>,

        /// English and French descriptions of the config changes
        #[arg(long, num_args = 2, value_names = ["EN", "FR"])]
        desc: Option<Vec<String>>,
    },
}

fn whats_new(desc: Option<Vec<String>>, default_en: &str, default_fr: &str) -> WhatsNew {
    match desc {
        Some(mut pair) if pair.len() == 2 => WhatsNew {
            description_fr: pair.pop().unwrap_or_default(),
            description_en: pair.pop().unwrap_or_default(),
        },
        _ => WhatsNew {
            description_en: default_en.to_string(),
            description_fr: default_fr.to_string(),
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Release {
            bucket,
            asset_dir,
            output_dir,
            version,
            only,
            region,
            no_new_config,
            compatible,
            desc,
            minify,
        } => {
            let aws_config = aws_config::defaults(BehaviorVersion::latest())
                .region(aws_config::Region::new(region.clone()))
                .load()
                .await;
            let s3_client = aws_sdk_s3::Client::new(&aws_config);
            let store = S3Store::new(s3_client, bucket, region);

            let opts = ReleaseOptions {
                asset_dir,
                output_dir,
                version,
                only: only.map(|names| names.into_iter().collect::<HashSet<_>>()),
                build_config: !no_new_config,
                compatible,
                whats_new: whats_new(desc, "", ""),
                minify_command: minify,
            };

            let summary = run_release(&store, &opts).await?;
            println!(
                "🚀 Uploaded {} of {} assets.",
                summary.uploaded, summary.scanned
            );
            for key in &summary.patched_configs {
                println!("Patched config `{key}`");
            }
            if let Some(key) = &summary.new_config {
                println!("✅ Published config `{key}`");
            }
        }
        Commands::Dev {
            asset_dir,
            config_dir,
            config_name,
            ios,
            android,
            desc,
        } => {
            let mut app_dirs = Vec::new();
            if let Some(dir) = ios {
                app_dirs.push((Platform::Ios, dir));
            }
            if let Some(dir) = android {
                app_dirs.push((Platform::Android, dir));
            }

            let opts = DevOptions {
                asset_dir,
                output_dir: config_dir,
                file_name: config_name,
                app_dirs,
                whats_new: whats_new(desc, "Test update.", "Mise à jour test."),
            };

            let written = build_dev_configs(&opts).await?;
            for path in written {
                println!("✅ Wrote `{}`", path.display());
            }
        }
    }

    Ok(())
}
