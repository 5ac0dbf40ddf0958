use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("snapper version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
