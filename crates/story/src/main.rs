mod echo;

use std::time::Duration;

use anyhow::Context as _;
use gpui_plate_kit::{
    BubbleMenuResolver, CommandPalette, ConversationController, ConversationUpdate, EntryView,
    KitConfig, MapTranslator, MemoryDocument, PresetPalette, PresetSelection, SurfaceCoordinator,
    TimeoutBackend, Toolbar, builtin,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::echo::EchoBackend;

const SAMPLE: &str = "The quick brown fox jumps over the lazy dog. /head";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    run(load_config()?).await
}

fn load_config() -> anyhow::Result<KitConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(KitConfig::default());
    };
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config from {path}"))?;
    KitConfig::from_json_str(&raw).with_context(|| format!("invalid config in {path}"))
}

fn translator() -> MapTranslator {
    MapTranslator::new([
        ("editor.undo", "Undo"),
        ("editor.redo", "Redo"),
        ("editor.bold", "Bold"),
        ("editor.italic", "Italic"),
        ("editor.underline", "Underline"),
        ("editor.strike", "Strikethrough"),
        ("editor.code", "Inline code"),
        ("editor.bullet_list", "Bulleted list"),
        ("editor.ordered_list", "Numbered list"),
        ("editor.todo_list", "Todo list"),
        ("editor.link", "Link"),
        ("editor.image", "Image"),
        ("editor.video", "Video"),
        ("editor.callout", "Callout"),
        ("editor.ai", "Ask AI"),
        ("editor.remove", "Remove"),
    ])
}

fn print_entries(label: &str, views: &[EntryView]) {
    let line: Vec<String> = views
        .iter()
        .map(|view| match view {
            EntryView::Divider => "|".to_string(),
            EntryView::Item {
                title,
                active,
                disabled,
                ..
            } => {
                let state = match (*active, *disabled) {
                    (_, true) => " (disabled)",
                    (true, false) => " (on)",
                    (false, false) => "",
                };
                format!("[{title}{state}]")
            }
        })
        .collect();
    println!("{label}: {}", line.join(" "));
    if let Ok(json) = serde_json::to_string(views) {
        debug!(%label, %json, "rendered entries");
    }
}

async fn run(config: KitConfig) -> anyhow::Result<()> {
    let registry = builtin::richtext();
    let translator = translator();
    let surfaces = SurfaceCoordinator::new();
    let mut doc = MemoryDocument::new(SAMPLE);

    let toolbar = Toolbar::compose(&registry, &translator, &doc);
    print_entries("toolbar", &toolbar.render(&doc));

    let trigger = SAMPLE.len() - "/head".len()..SAMPLE.len();
    let mut palette = CommandPalette::new(registry.slash_groups(), Some(trigger), &doc)
        .max_per_group(config.palette.max_commands_per_group);
    palette.set_query("head", &doc);
    let dispatch = palette.enter(&mut doc)?;
    info!(?dispatch, text = doc.text(), "slash command dispatched");

    doc.select_text("quick brown fox");
    toolbar.trigger("bold", &mut doc)?;
    let resolver = BubbleMenuResolver::new(config.bubble_menu.clone(), surfaces.clone());
    match resolver.resolve(&registry, &translator, &doc) {
        Some(menu) => {
            let views: Vec<EntryView> = menu.entries.iter().map(|e| e.view(&doc)).collect();
            print_entries(&format!("bubble menu ({:?})", menu.node_type), &views);
        }
        None => println!("bubble menu: hidden"),
    }

    let backend = TimeoutBackend::from_config(
        EchoBackend::new(Duration::from_millis(40)),
        &config.assistant,
    );
    let mut assistant = ConversationController::with_backend(backend, surfaces.clone());
    assistant.open()?;
    info!(
        conversation = %assistant.id(),
        bubble_menu = resolver.resolve(&registry, &translator, &doc).is_some(),
        "assistant opened"
    );

    let mut presets = PresetPalette::default();
    presets.move_down();
    let Some(PresetSelection::Picked(preset)) = presets.enter() else {
        anyhow::bail!("expected a preset under the cursor");
    };
    assistant.shortcut(&preset, &doc)?;

    print!("assistant: ");
    while let Some(update) = assistant.next_update().await {
        match update {
            ConversationUpdate::Chunk { text } => print!("{text}"),
            ConversationUpdate::Completed => println!(),
            ConversationUpdate::Failed { message } => {
                println!();
                warn!(%message, "generation failed");
            }
        }
    }

    if assistant.result().is_empty() {
        assistant.close();
    } else {
        assistant.replace(&mut doc)?;
    }
    println!("document: {}", doc.text());
    Ok(())
}
