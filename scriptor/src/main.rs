//! scriptor - sectioned manuscript editor and exporter
//!
//! Each invocation loads the saved project, runs one command to completion
//! and saves the result.

#![deny(unsafe_code)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{CanvasArgs, Cli, Commands, ExportFormat};
use itertools::Itertools;
use scriptor::config::ScriptorConfig;
use scriptor::document_model::{Document, RenameOutcome};
use scriptor::gateway::{filename_hint, ExportGateway};
use scriptor::geometry::resolve_geometry;
use scriptor::html_exporter::write_output;
use scriptor::project_store::ProjectStore;
use scriptor::prompts::PromptTable;
use scriptor::renderer::{render_with_geometry, ExportTarget};
use scriptor::service::safe_filename;
use scriptor::session::EditorSession;
use scriptor::{html_exporter, manuscript, markdown_exporter, text_exporter};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Main entry point for the scriptor CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging if verbose
    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    if let Commands::InitConfig { force } = cli.command {
        return handle_init_config_command(&cli.config, force);
    }

    let config = ScriptorConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    let store = ProjectStore::new(&config.project.store_dir);

    match cli.command {
        Commands::InitConfig { .. } => {}

        Commands::New {
            title,
            subtitle,
            force,
        } => {
            handle_new_command(&store, &title, &subtitle, force)?;
        }

        Commands::Show => {
            handle_show_command(&store)?;
        }

        Commands::SetTitle { title, subtitle } => {
            handle_set_title_command(&store, title.as_deref(), subtitle.as_deref())?;
        }

        Commands::AddSection { name } => {
            handle_add_section_command(&store, name.as_deref())?;
        }

        Commands::RenameSection { old, new } => {
            handle_rename_section_command(&store, &old, &new)?;
        }

        Commands::DeleteSection { name, yes } => {
            handle_delete_section_command(&store, &name, yes)?;
        }

        Commands::DeleteProject { yes } => {
            handle_delete_project_command(&store, yes)?;
        }

        Commands::Write {
            section,
            file,
            html,
            append,
        } => {
            handle_write_command(&store, &section, file, html, append)?;
        }

        Commands::ImportManuscript { section, file } => {
            handle_import_command(&store, &section, &file)?;
        }

        Commands::Replace {
            search,
            replacement,
            section,
        } => {
            handle_replace_command(&store, &search, &replacement, section.as_deref())?;
        }

        Commands::Stats { section, goal } => {
            handle_stats_command(&store, section.as_deref(), goal)?;
        }

        Commands::Prompt { niche, list } => {
            handle_prompt_command(&config, niche.as_deref(), list)?;
        }

        Commands::Geometry { canvas } => {
            handle_geometry_command(&canvas);
        }

        Commands::Render {
            target,
            output,
            canvas,
        } => {
            handle_render_command(&store, target.into(), output, &canvas)?;
        }

        Commands::Export {
            format,
            output,
            open,
            canvas,
        } => {
            handle_export_command(&config, &store, format, output, open, &canvas)?;
        }
    }

    Ok(())
}

/// Handle the init-config command
fn handle_init_config_command(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it",
            path.display()
        );
    }
    ScriptorConfig::default()
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("✓ Wrote default configuration to {}", path.display());
    Ok(())
}

/// Handle the new command
fn handle_new_command(store: &ProjectStore, title: &str, subtitle: &str, force: bool) -> Result<()> {
    if !force && load_saved(store)?.is_some() {
        anyhow::bail!("A project already exists. Use --force to replace it");
    }
    let document = Document::new(title, subtitle);
    save(store, &document)?;
    println!(
        "✓ Created project with {} sections",
        document.structure.len()
    );
    Ok(())
}

/// Handle the show command
fn handle_show_command(store: &ProjectStore) -> Result<()> {
    let document = load(store)?;
    println!("Title: {}", scriptor::renderer::display_title(&document));
    if !document.subtitle.is_empty() {
        println!("Subtitle: {}", document.subtitle);
    }
    println!("\n{} sections:", document.structure.len());
    for (idx, (name, html)) in document.sections().enumerate() {
        println!(
            "  {:>2}. {} ({} words)",
            idx + 1,
            name,
            scriptor::document_model::count_words(html)
        );
    }
    println!("\nTotal: {} words", document.word_count());
    Ok(())
}

/// Handle the set-title command
fn handle_set_title_command(
    store: &ProjectStore,
    title: Option<&str>,
    subtitle: Option<&str>,
) -> Result<()> {
    let mut document = load(store)?;
    if !document.set_heading(title, subtitle) {
        println!("Title unchanged");
        return Ok(());
    }
    save(store, &document)?;
    println!("✓ Title: {}", scriptor::renderer::display_title(&document));
    if !document.subtitle.is_empty() {
        println!("  Subtitle: {}", document.subtitle);
    }
    Ok(())
}

/// Handle the add-section command
fn handle_add_section_command(store: &ProjectStore, name: Option<&str>) -> Result<()> {
    let mut session = EditorSession::new(load(store)?);
    let added = session
        .add_section(name)
        .with_context(|| "Failed to add section")?;
    save(store, &session.into_document())?;
    println!("✓ Added section '{}'", added);
    Ok(())
}

/// Handle the rename-section command
fn handle_rename_section_command(store: &ProjectStore, old: &str, new: &str) -> Result<()> {
    let mut document = load(store)?;
    match document.rename_section(old, new) {
        RenameOutcome::Renamed { from, to } => {
            save(store, &document)?;
            println!("✓ Renamed '{}' to '{}'", from, to);
        }
        RenameOutcome::Unchanged => println!("Name unchanged"),
        RenameOutcome::Duplicate(name) => {
            println!("A section named '{}' already exists; nothing renamed", name);
        }
        RenameOutcome::NotFound => println!("No section named '{}'", old),
    }
    Ok(())
}

/// Handle the delete-section command
fn handle_delete_section_command(store: &ProjectStore, name: &str, yes: bool) -> Result<()> {
    let mut document = load(store)?;
    if !document.has_section(name) {
        anyhow::bail!("No section named '{}'", name);
    }
    if !yes && !confirm(&format!("Delete section '{}'? This cannot be undone.", name))? {
        println!("Cancelled");
        return Ok(());
    }
    document.delete_section(name);
    save(store, &document)?;
    println!("✓ Deleted section '{}'", name);
    Ok(())
}

/// Handle the delete-project command
fn handle_delete_project_command(store: &ProjectStore, yes: bool) -> Result<()> {
    if !yes && !confirm("Delete the whole project? This cannot be undone.")? {
        println!("Cancelled");
        return Ok(());
    }
    let removed = store
        .delete()
        .with_context(|| format!("Failed to delete {}", store.record_path().display()))?;
    if removed {
        println!("✓ Project deleted. The next command starts from the default sections");
    } else {
        println!("No saved project");
    }
    Ok(())
}

/// Handle the write command
fn handle_write_command(
    store: &ProjectStore,
    section: &str,
    file: Option<PathBuf>,
    html: Option<String>,
    append: bool,
) -> Result<()> {
    let content = match (file, html) {
        (Some(path), _) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, Some(html)) => html,
        (None, None) => anyhow::bail!("Give the content with --file or --html"),
    };

    let mut session = EditorSession::new(load(store)?);
    session
        .open_section(section)
        .with_context(|| format!("Cannot write to section '{}'", section))?;
    if append {
        session.append(&content);
    } else {
        session.edit(&content);
    }
    println!(
        "✓ '{}' now has {} words",
        session.active_section().unwrap_or(section),
        session.word_count()
    );
    save(store, &session.into_document())
}

/// Handle the import-manuscript command
fn handle_import_command(store: &ProjectStore, section: &str, file: &Path) -> Result<()> {
    let mut session = EditorSession::new(load(store)?);
    if !session.document().has_section(section) {
        anyhow::bail!("No section named '{}'. Add it first", section);
    }
    session
        .open_section(section)
        .with_context(|| format!("Cannot open section '{}'", section))?;
    manuscript::import_manuscript(&mut session, file)
        .with_context(|| format!("Failed to import {}", file.display()))?;
    println!(
        "✓ Imported {} into '{}' ({} words)",
        file.display(),
        section,
        session.word_count()
    );
    save(store, &session.into_document())
}

/// Handle the replace command
fn handle_replace_command(
    store: &ProjectStore,
    search: &str,
    replacement: &str,
    section: Option<&str>,
) -> Result<()> {
    let mut session = EditorSession::new(load(store)?);
    if let Some(name) = section {
        if !session.document().has_section(name) {
            anyhow::bail!("No section named '{}'", name);
        }
        session
            .open_section(name)
            .with_context(|| format!("Cannot open section '{}'", name))?;
    }

    let count = session.replace_all(search, replacement);
    if count == 0 {
        println!("No matches for '{}'", search.trim());
        return Ok(());
    }
    println!("✓ Replaced {} occurrence(s)", count);
    save(store, &session.into_document())
}

/// Handle the stats command
fn handle_stats_command(store: &ProjectStore, section: Option<&str>, goal: Option<usize>) -> Result<()> {
    let document = load(store)?;

    let Some(name) = section else {
        println!("Total: {} words", document.word_count());
        let empty = document
            .sections()
            .filter(|(_, html)| scriptor::document_model::count_words(html) == 0)
            .map(|(name, _)| name)
            .join(", ");
        if !empty.is_empty() {
            println!("Empty sections: {}", empty);
        }
        return Ok(());
    };

    if !document.has_section(name) {
        anyhow::bail!("No section named '{}'", name);
    }
    let mut session = EditorSession::new(document);
    session
        .open_section(name)
        .with_context(|| format!("Cannot open section '{}'", name))?;
    match goal {
        Some(goal) => {
            let progress = session.goal_progress(goal);
            let marker = if progress.reached() { " ✓ goal reached" } else { "" };
            println!("{}: {} words{}", name, progress, marker);
        }
        None => println!("{}: {} words", name, session.word_count()),
    }
    Ok(())
}

/// Handle the prompt command
fn handle_prompt_command(config: &ScriptorConfig, niche: Option<&str>, list: bool) -> Result<()> {
    let prompts_file = config.inspiration.prompts_file.as_deref();
    let table = PromptTable::load_or_fallback(prompts_file).with_context(|| {
        format!(
            "Failed to load prompts from {}",
            prompts_file.map(|path| path.display().to_string()).unwrap_or_default()
        )
    })?;

    if list {
        for niche in table.niches() {
            println!("{} ({} prompts)", niche, table.prompts(niche).len());
        }
        return Ok(());
    }

    println!("{}", table.inspire(niche, &mut rand::rng()));
    Ok(())
}

/// Handle the geometry command
fn handle_geometry_command(canvas: &CanvasArgs) {
    let selection = canvas.selection();
    let size = selection.canvas();
    let (width_px, height_px) = size.to_pixels();
    let geometry = resolve_geometry(&selection);

    println!(
        "Canvas: {} x {} {:?} ({:.0} x {:.0} px)",
        size.width, size.height, size.unit, width_px, height_px
    );
    println!(
        "Page: {} x {} twips ({:.2} x {:.2} in)",
        geometry.width_twips,
        geometry.height_twips,
        geometry.width_inches(),
        geometry.height_inches()
    );
    println!(
        "Margin: {} twips ({:.2} in)",
        geometry.margin_twips,
        geometry.margin_inches()
    );
}

/// Handle the render command
fn handle_render_command(
    store: &ProjectStore,
    target: ExportTarget,
    output: Option<PathBuf>,
    canvas: &CanvasArgs,
) -> Result<()> {
    let document = load(store)?;
    let geometry = resolve_geometry(&canvas.selection());
    let html = render_with_geometry(&document, target, &geometry);

    match output {
        Some(path) => {
            write_output(&path, &html)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Successfully wrote: {}", path.display());
        }
        None => println!("{}", html),
    }
    Ok(())
}

/// Handle the export command
fn handle_export_command(
    config: &ScriptorConfig,
    store: &ProjectStore,
    format: ExportFormat,
    output: Option<PathBuf>,
    open: bool,
    canvas: &CanvasArgs,
) -> Result<()> {
    let document = load(store)?;
    let geometry = resolve_geometry(&canvas.selection());

    let target = match format {
        ExportFormat::Pdf => ExportTarget::Pdf,
        ExportFormat::Docx => ExportTarget::Docx,
        local => {
            let output = output.unwrap_or_else(|| default_output(&document, local));
            let written = match local {
                ExportFormat::Html => html_exporter::to_html(&document, &geometry, &output),
                ExportFormat::Markdown => markdown_exporter::to_markdown(&document, &output),
                _ => text_exporter::to_text(&document, &output),
            };
            written.with_context(|| format!("Failed to export to {}", output.display()))?;
            println!("✓ Successfully wrote: {}", output.display());
            return Ok(());
        }
    };

    if output.is_some() {
        println!("Note: --output is ignored for {} exports; the service returns a link", target);
    }

    println!("Exporting to {}...", target.extension().to_uppercase());
    let html = render_with_geometry(&document, target, &geometry);
    let gateway = ExportGateway::from_config(config);
    let url = gateway
        .request_export(target, &html, &filename_hint(&document.title), &geometry)
        .with_context(|| format!("{} export failed", target.extension().to_uppercase()))?;

    if open {
        open::that(&url).with_context(|| format!("Failed to open {}", url))?;
        println!("✓ Opened download link");
    } else {
        println!("✓ Download link: {}", url);
    }
    Ok(())
}

/// Default file name for a local export, from the title
fn default_output(document: &Document, format: ExportFormat) -> PathBuf {
    let title = document.title.trim();
    let stem = safe_filename((!title.is_empty()).then_some(title));
    PathBuf::from(format!("{}.{}", stem, format.extension()))
}

/// Load the saved project (or a fresh one)
fn load(store: &ProjectStore) -> Result<Document> {
    store
        .load_or_default()
        .with_context(|| format!("Failed to load {}", store.record_path().display()))
}

/// Load the saved project, if there is one
fn load_saved(store: &ProjectStore) -> Result<Option<Document>> {
    store
        .load()
        .with_context(|| format!("Failed to load {}", store.record_path().display()))
}

/// Save the project
fn save(store: &ProjectStore, document: &Document) -> Result<()> {
    store
        .save(document)
        .with_context(|| format!("Failed to save {}", store.record_path().display()))
}

/// Ask a yes/no question on stdin; anything but "y"/"yes" is no
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
