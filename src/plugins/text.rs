//! Plain-text script engine.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{PluginError, ScriptVars, ScriptVm};

/// Engine for `main.txt` plugins: the file's text is the reply, with
/// `{nick}` and `{channel}` filled in from the invocation.
#[derive(Default)]
pub struct TextVm {
    scripts: RwLock<HashMap<String, String>>,
}

impl TextVm {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScriptVm for TextVm {
    fn kind(&self) -> &'static str {
        "txt"
    }

    fn load_script(&self, name: &str, source: &str) -> Result<(), PluginError> {
        let mut scripts = self.scripts.write();
        if scripts.contains_key(name) {
            return Err(PluginError::AlreadyLoaded(name.to_string()));
        }
        scripts.insert(name.to_string(), source.trim_end().to_string());
        Ok(())
    }

    fn run(&self, name: &str, vars: &ScriptVars) -> Result<String, PluginError> {
        let scripts = self.scripts.read();
        let template = scripts
            .get(name)
            .ok_or_else(|| PluginError::NotLoaded(name.to_string()))?;
        Ok(template
            .replace("{nick}", &vars.nick)
            .replace("{channel}", &vars.channel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> ScriptVars {
        ScriptVars {
            nick: "alice".into(),
            channel: "#chat".into(),
        }
    }

    #[test]
    fn substitutes_placeholders() {
        let vm = TextVm::new();
        vm.load_script("greet", "hello {nick}, welcome to {channel}\n").unwrap();
        assert_eq!(vm.run("greet", &vars()).unwrap(), "hello alice, welcome to #chat");
    }

    #[test]
    fn duplicate_and_missing_scripts() {
        let vm = TextVm::new();
        vm.load_script("greet", "hi").unwrap();
        assert!(matches!(
            vm.load_script("greet", "again"),
            Err(PluginError::AlreadyLoaded(_))
        ));
        assert!(matches!(vm.run("nope", &vars()), Err(PluginError::NotLoaded(_))));
    }
}
