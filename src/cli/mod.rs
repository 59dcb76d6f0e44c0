mod scan;
mod shared;

use camino::Utf8Path;
use clap::Parser;
use simple_error::{SimpleResult, bail};

use self::scan::validate_and_fix_scan_settings;
pub use self::scan::{ScanSettings, write_scan_settings};
use self::shared::validate_and_fix_shared_settings;
pub use self::shared::SharedSettings;

#[derive(Parser)]
#[command(
    version,
    about,
    help_template = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
#[clap(rename_all = "kebab_case")]
pub struct Settings {
    #[command(flatten)]
    pub shared: SharedSettings,

    #[command(flatten)]
    pub scan: ScanSettings,
}

impl Settings {
    pub fn get_output_dir(&self) -> &Utf8Path {
        &self.scan.output_dir
    }
}

/// Checks if a directory does not exist
///
pub fn check_novel_dirname(dirname: &Utf8Path, label: &str) -> SimpleResult<()> {
    if dirname.exists() {
        bail!("{label} already exists: \"{dirname}\"");
    }
    Ok(())
}

/// Validate settings and update parameters that can't be processed by clap
///
fn validate_and_fix_settings_impl(mut settings: Settings) -> SimpleResult<Settings> {
    settings.shared = validate_and_fix_shared_settings(settings.shared)?;
    settings.scan = validate_and_fix_scan_settings(settings.scan)?;
    Ok(settings)
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes no logger has been configured yet, so errors are printed directly before exit.
///
pub fn validate_and_fix_settings(settings: Settings) -> Settings {
    match validate_and_fix_settings_impl(settings) {
        Ok(x) => x,
        Err(msg) => {
            eprintln!("Invalid command-line setting: {msg}");
            std::process::exit(exitcode::USAGE);
        }
    }
}

pub fn parse_settings() -> Settings {
    Settings::parse()
}
