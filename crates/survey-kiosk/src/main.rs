fn main() -> anyhow::Result<()> {
    survey_kiosk::cli::main()
}
