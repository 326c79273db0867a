use serde_json::json;

use crate::bubble_menu::{BubbleMenuMap, BuiltinEntry, NodeType};
use crate::extension::{ButtonDescriptor, ButtonSet, Extension};
use crate::icon::IconName;
use crate::palette::{Command, CommandGroup};
use crate::registry::ExtensionRegistry;

pub const OPEN_ASSISTANT: &str = "ai.open_assistant";

pub fn history() -> Extension {
    Extension::new("history")
        .sort_key(1)
        .divider(true)
        .button(|ctx| {
            Ok(ButtonSet::Many(vec![
                ButtonDescriptor::new("undo", IconName::Undo2, ctx.t("editor.undo"), |doc| {
                    doc.run_command("history.undo", None)
                })
                .shortcut_keys(["Mod", "Z"])
                .disabled_when(|doc| !doc.can_run("history.undo")),
                ButtonDescriptor::new("redo", IconName::Redo2, ctx.t("editor.redo"), |doc| {
                    doc.run_command("history.redo", None)
                })
                .shortcut_keys(["Shift", "Mod", "Z"])
                .disabled_when(|doc| !doc.can_run("history.redo")),
            ]))
        })
}

fn mark(
    name: &'static str,
    mark: &'static str,
    icon: IconName,
    keys: &'static [&'static str],
    sort_key: i32,
) -> Extension {
    Extension::new(name).sort_key(sort_key).button(move |ctx| {
        let command = format!("marks.toggle_{mark}");
        let guard = command.clone();
        Ok(ButtonDescriptor::new(
            name,
            icon,
            ctx.t(&format!("editor.{name}")),
            move |doc| doc.run_command(&command, None),
        )
        .shortcut_keys(keys.iter().copied())
        .active_when(move |doc| doc.selection().has_mark(mark))
        .disabled_when(move |doc| !doc.can_run(&guard))
        .into())
    })
}

pub fn bold() -> Extension {
    mark("bold", "bold", IconName::Bold, &["Mod", "B"], 10)
}

pub fn italic() -> Extension {
    mark("italic", "italic", IconName::Italic, &["Mod", "I"], 11)
}

pub fn underline() -> Extension {
    mark("underline", "underline", IconName::Underline, &["Mod", "U"], 12)
}

pub fn strike() -> Extension {
    mark(
        "strike",
        "strikethrough",
        IconName::Strikethrough,
        &["Shift", "Mod", "S"],
        13,
    )
}

pub fn code() -> Extension {
    mark("code", "code", IconName::CodeXml, &["Mod", "E"], 14).divider(true)
}

pub fn heading() -> Extension {
    let levels = [
        (1, IconName::Heading1, ["h1", "title"]),
        (2, IconName::Heading2, ["h2", "subtitle"]),
        (3, IconName::Heading3, ["h3", "section"]),
    ];
    let commands = levels.into_iter().map(|(level, icon, aliases)| {
        Command::new(
            format!("heading{level}"),
            format!("Heading {level}"),
            icon,
            move |doc, _range| {
                doc.run_command("block.set_heading", Some(json!({ "level": level })))
            },
        )
        .aliases(aliases)
        .shortcut(format!("Mod-Alt-{level}"))
        .hidden_when(|doc| !doc.can_run("block.set_heading"))
    });
    Extension::new("heading")
        .toolbar(false)
        .slash_commands([CommandGroup::new("format", "Format", commands)])
}

pub fn lists() -> Extension {
    const LISTS: [(&str, &str, IconName, &str); 3] = [
        ("bullet_list", "Bullet list", IconName::List, "list.toggle_bulleted"),
        (
            "ordered_list",
            "Numbered list",
            IconName::ListOrdered,
            "list.toggle_ordered",
        ),
        ("todo_list", "Todo list", IconName::ListTodo, "todo.toggle"),
    ];

    let commands = LISTS.into_iter().map(|(name, label, icon, command)| {
        Command::new(name, label, icon, move |doc, _range| {
            doc.run_command(command, None)
        })
        .aliases([name.split('_').next().unwrap_or(name)])
    });

    Extension::new("lists")
        .sort_key(20)
        .divider(true)
        .button(|ctx| {
            Ok(LISTS
                .into_iter()
                .map(|(name, _, icon, command)| {
                    ButtonDescriptor::new(
                        name,
                        icon,
                        ctx.t(&format!("editor.{name}")),
                        move |doc| doc.run_command(command, None),
                    )
                    .disabled_when(move |doc| !doc.can_run(command))
                })
                .collect::<Vec<_>>()
                .into())
        })
        .slash_commands([CommandGroup::new("format", "Format", commands)])
}

pub fn link() -> Extension {
    Extension::new("link")
        .sort_key(30)
        .option("open_on_click", json!(true))
        .button(|ctx| {
            Ok(
                ButtonDescriptor::new("link", IconName::Link, ctx.t("editor.link"), |doc| {
                    doc.run_command("link.edit", None)
                })
                .shortcut_keys(["Mod", "K"])
                .active_when(|doc| doc.selection().is_link())
                .into(),
            )
        })
        .bubble_button(|ctx| {
            if !ctx.document.selection().is_link() {
                return Ok(ButtonDescriptor::new(
                    "link",
                    IconName::Link,
                    ctx.t("editor.link"),
                    |doc| doc.run_command("link.edit", None),
                )
                .into());
            }
            let open_on_click = ctx
                .extension
                .get_option("open_on_click")
                .and_then(|v| v.as_bool())
                .unwrap_or(true);
            let mut buttons = vec![ButtonDescriptor::new(
                "link_edit",
                IconName::Pen,
                ctx.t("editor.link.edit"),
                |doc| doc.run_command("link.edit", None),
            )];
            if open_on_click {
                buttons.push(ButtonDescriptor::new(
                    "link_open",
                    IconName::ExternalLink,
                    ctx.t("editor.link.open"),
                    |doc| {
                        let href = doc.selection().link.unwrap_or_default();
                        doc.run_command("link.open", Some(json!({ "href": href })))
                    },
                ));
            }
            buttons.push(ButtonDescriptor::new(
                "link_unlink",
                IconName::Unlink,
                ctx.t("editor.link.unlink"),
                |doc| doc.run_command("link.unset", None),
            ));
            Ok(buttons.into())
        })
}

pub fn image() -> Extension {
    Extension::new("image")
        .sort_key(40)
        .option("accept", json!("image/*"))
        .button(|ctx| {
            let accept = ctx
                .extension
                .get_option("accept")
                .cloned()
                .unwrap_or_else(|| json!("image/*"));
            Ok(
                ButtonDescriptor::new("image", IconName::Image, ctx.t("editor.image"), move |doc| {
                    doc.run_command("image.insert", Some(json!({ "accept": accept.clone() })))
                })
                .into(),
            )
        })
        .slash_commands([CommandGroup::new(
            "insert",
            "Insert",
            [Command::new("image", "Image", IconName::Image, |doc, _range| {
                doc.run_command("image.insert", None)
            })
            .aliases(["picture", "img"])],
        )])
}

pub fn video() -> Extension {
    Extension::new("video")
        .sort_key(41)
        .button(|ctx| {
            Ok(
                ButtonDescriptor::new("video", IconName::Film, ctx.t("editor.video"), |doc| {
                    doc.run_command("video.insert", None)
                })
                .into(),
            )
        })
        .bubble_button(|ctx| {
            Ok(["small", "medium", "large"]
                .into_iter()
                .map(|size| {
                    ButtonDescriptor::new(
                        format!("video_{size}"),
                        IconName::Film,
                        ctx.t(&format!("editor.video.{size}")),
                        move |doc| doc.run_command("video.set_size", Some(json!({ "size": size }))),
                    )
                })
                .collect::<Vec<_>>()
                .into())
        })
        .slash_commands([CommandGroup::new(
            "insert",
            "Insert",
            [Command::new("video", "Video", IconName::Film, |doc, _range| {
                doc.run_command("video.insert", None)
            })
            .aliases(["movie", "embed"])],
        )])
}

pub fn callout() -> Extension {
    Extension::new("callout")
        .sort_key(42)
        .divider(true)
        .button(|ctx| {
            Ok(ButtonDescriptor::new(
                "callout",
                IconName::MessageSquareText,
                ctx.t("editor.callout"),
                |doc| doc.run_command("callout.insert", None),
            )
            .into())
        })
        .slash_commands([CommandGroup::new(
            "insert",
            "Insert",
            [Command::new(
                "callout",
                "Callout",
                IconName::MessageSquareText,
                |doc, _range| doc.run_command("callout.insert", None),
            )
            .aliases(["note", "tip", "warning"])],
        )])
}

pub fn ai() -> Extension {
    Extension::new("ai")
        .sort_key(50)
        .spacer(true)
        .button(|ctx| {
            Ok(ButtonDescriptor::new(
                "ai",
                IconName::WandSparkles,
                ctx.t("editor.ai"),
                |doc| doc.run_command(OPEN_ASSISTANT, None),
            )
            .shortcut_keys(["Mod", "J"])
            .disabled_when(|doc| !doc.selection().has_text())
            .into())
        })
        .slash_commands([CommandGroup::new(
            "ai",
            "AI",
            [Command::new(
                "ask_ai",
                "Ask AI",
                IconName::WandSparkles,
                |doc, _range| doc.run_command(OPEN_ASSISTANT, None),
            )
            .aliases(["ai", "assistant", "write"])],
        )])
}

pub fn extensions() -> Vec<Extension> {
    vec![
        history(),
        bold(),
        italic(),
        underline(),
        strike(),
        code(),
        heading(),
        lists(),
        link(),
        image(),
        video(),
        callout(),
        ai(),
    ]
}

pub fn richtext() -> ExtensionRegistry {
    ExtensionRegistry::new(extensions()).expect("builtin extension names are unique")
}

pub fn bubble_menu_map() -> BubbleMenuMap {
    BubbleMenuMap::new()
        .with(NodeType::Link, ["link"])
        .with(
            NodeType::Video,
            ["video", "divider", BuiltinEntry::RemoveSelection.name()],
        )
        .with(
            NodeType::Text,
            [
                "bold", "italic", "underline", "strike", "code", "divider", "link", "divider", "ai",
            ],
        )
}
