use std::collections::HashMap;

use crate::error::RegistryError;
use crate::extension::Extension;
use crate::palette::CommandGroup;

#[derive(Debug, Clone, Default)]
pub struct ExtensionRegistry {
    extensions: Vec<Extension>,
    by_name: HashMap<String, usize>,
}

impl ExtensionRegistry {
    pub fn new(extensions: impl IntoIterator<Item = Extension>) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for extension in extensions {
            registry.register(extension)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, extension: Extension) -> Result<(), RegistryError> {
        if self.by_name.contains_key(&extension.name) {
            return Err(RegistryError::DuplicateExtension(extension.name));
        }
        self.by_name
            .insert(extension.name.clone(), self.extensions.len());
        self.extensions.push(extension);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Extension> {
        self.by_name.get(name).map(|&ix| &self.extensions[ix])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.extensions.iter()
    }

    pub fn sorted(&self) -> Vec<&Extension> {
        let mut sorted: Vec<&Extension> = self.extensions.iter().collect();
        sorted.sort_by_key(|ext| ext.sort_key);
        sorted
    }

    pub fn slash_groups(&self) -> Vec<CommandGroup> {
        let mut groups: Vec<CommandGroup> = Vec::new();
        for extension in self.sorted() {
            for group in &extension.slash_commands {
                match groups.iter_mut().find(|g| g.name == group.name) {
                    Some(existing) => existing.commands.extend(group.commands.iter().cloned()),
                    None => groups.push(group.clone()),
                }
            }
        }
        groups
    }
}
