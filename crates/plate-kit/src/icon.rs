use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconName {
    Bold,
    CodeXml,
    Film,
    Heading1,
    Heading2,
    Heading3,
    Image,
    Italic,
    Languages,
    Link,
    Unlink,
    ExternalLink,
    List,
    ListOrdered,
    ListTodo,
    MessageSquareText,
    Minus,
    Pen,
    Strikethrough,
    Trash2,
    Underline,
    Undo2,
    Redo2,
    WandSparkles,
}

impl IconName {
    pub fn path(self) -> &'static str {
        match self {
            Self::Bold => "icons/bold.svg",
            Self::CodeXml => "icons/code-xml.svg",
            Self::Film => "icons/film.svg",
            Self::Heading1 => "icons/heading-1.svg",
            Self::Heading2 => "icons/heading-2.svg",
            Self::Heading3 => "icons/heading-3.svg",
            Self::Image => "icons/image.svg",
            Self::Italic => "icons/italic.svg",
            Self::Languages => "icons/languages.svg",
            Self::Link => "icons/link.svg",
            Self::Unlink => "icons/unlink.svg",
            Self::ExternalLink => "icons/external-link.svg",
            Self::List => "icons/list.svg",
            Self::ListOrdered => "icons/list-ordered.svg",
            Self::ListTodo => "icons/list-todo.svg",
            Self::MessageSquareText => "icons/message-square-text.svg",
            Self::Minus => "icons/minus.svg",
            Self::Pen => "icons/pen.svg",
            Self::Strikethrough => "icons/strikethrough.svg",
            Self::Trash2 => "icons/trash-2.svg",
            Self::Underline => "icons/underline.svg",
            Self::Undo2 => "icons/undo-2.svg",
            Self::Redo2 => "icons/redo-2.svg",
            Self::WandSparkles => "icons/wand-sparkles.svg",
        }
    }
}
