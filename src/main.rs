use clap::Parser;
use color_eyre::Result;
use ratatui::DefaultTerminal;
use std::path::Path;
use std::sync::mpsc::channel;
use viztab::cli::Args;
use viztab::{App, AppConfig, AppEvent, ConfigManager, OpenOptions, Upload};

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, args: &Args, config: AppConfig) -> Result<()> {
    let (tx, rx) = channel::<AppEvent>();
    let mut app = App::new_with_config(tx.clone(), config.clone());
    if args.debug {
        app.enable_debug();
    }
    let opts = OpenOptions::from_args_and_config(args, &config);
    render(&mut terminal, &mut app)?;
    if let Some(path) = &args.path {
        tx.send(AppEvent::Open(path.clone(), opts))?;
    }

    loop {
        if crossterm::event::poll(std::time::Duration::from_millis(25))? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(std::time::Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

/// Load the file, write chart input JSON, and exit without entering the UI.
fn export_chart_headless(args: &Args, config: &AppConfig, out: &Path) -> Result<()> {
    let path = args
        .path
        .as_ref()
        .ok_or_else(|| color_eyre::eyre::eyre!("--export-chart requires a data file path"))?;
    let opts = OpenOptions::from_args_and_config(args, config);

    let (format, dataset) = viztab::load_path(path, opts.format, opts.compression)?;
    if dataset.is_empty() {
        return Err(color_eyre::eyre::eyre!(
            "{} contained no records.",
            path.display()
        ));
    }

    let mut upload = Upload::new(path.clone(), format, dataset);
    if let Some(name) = &opts.category_field {
        if upload.fields.categorical.iter().any(|f| f == name) {
            upload.category_field = Some(name.clone());
        }
    }
    if let Some(name) = &opts.value_field {
        if upload.fields.numeric.iter().any(|f| f == name) {
            upload.value_field = Some(name.clone());
        }
    }

    let kind = opts.chart_kind.unwrap_or(viztab::ChartKind::Bar);
    let (Some(category_field), Some(value_field)) = (
        upload.category_field.as_deref(),
        upload.value_field.as_deref(),
    ) else {
        return Err(color_eyre::eyre::eyre!(
            "Cannot create {} chart. Need at least one numeric and one categorical field.",
            kind.as_str()
        ));
    };

    let input = viztab::chart_input(&upload.dataset, category_field, value_field, kind);
    viztab::chart_export::write_chart_json(out, &input)?;
    println!("Chart input written to {}", out.display());
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let config_manager = ConfigManager::new(viztab::APP_NAME)?;
        match config_manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Config written to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error writing config: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;

    let config = AppConfig::load(viztab::APP_NAME).unwrap_or_else(|e| {
        eprintln!("Warning: {}. Using default configuration.", e);
        AppConfig::default()
    });

    if let Some(out) = args.export_chart.as_deref() {
        return export_chart_headless(&args, &config, out);
    }

    let terminal = ratatui::init();
    let result = run(terminal, &args, config);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!(
            "Error: {}",
            viztab::error_display::user_message_from_report(&e, args.path.as_deref())
        );
        std::process::exit(1);
    }
    Ok(())
}
