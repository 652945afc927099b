use anyhow::Result;

fn main() -> Result<()> {
    rootsense::cli::run()
}
