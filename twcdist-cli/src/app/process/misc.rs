pub fn generate_shell_completions(generator: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = crate::app::cli::build_cli();
    let bin_name = cmd.get_name().to_string();
    clap_complete::generate(generator, &mut cmd, bin_name, &mut std::io::stdout());
    Ok(())
}
