use smallsh::{Config, Environment, Interpreter, ShellState, SignalController, Terminal, logging};

fn main() -> anyhow::Result<()> {
    let env = Environment::new();
    let config = Config::from_env(&env);
    logging::init(&config)?;

    let state = ShellState::new(env, config);
    let _signals = SignalController::install(state.foreground_only_flag())?;

    let mut terminal = Terminal::new()?;
    let code = Interpreter::new(state).repl(&mut terminal, &mut std::io::stdout())?;
    std::process::exit(code)
}
