fn main() -> anyhow::Result<()> {
    ytxcodec::cli::run_cli()
}
