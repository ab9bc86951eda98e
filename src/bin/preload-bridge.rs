use anyhow::Result;

fn main() -> Result<()> {
    preload_bridge::cli::run::<String>(None)
}
