//! msm binary entry point.

fn main() {
    if let Err(e) = msm::cli::run() {
        msm::ui::output::error(format!("{:#}", e));
        std::process::exit(1);
    }
}
