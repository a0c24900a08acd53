//! Page templates.
//!
//! Templates come from the configured directory when it exists; otherwise
//! the copies compiled into the binary are used.

use std::path::Path;

use minijinja::{path_loader, Environment};
use tracing::debug;

const HOME: &str = include_str!("../templates/home.html");
const CHAT: &str = include_str!("../templates/chat.html");

pub fn environment(dir: Option<&Path>) -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    match dir {
        Some(dir) if dir.is_dir() => {
            debug!("Loading templates from {:?}", dir);
            env.set_loader(path_loader(dir));
        }
        _ => {
            env.add_template("home.html", HOME)?;
            env.add_template("chat.html", CHAT)?;
        }
    }
    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_embedded_templates_render() {
        let env = environment(None).unwrap();
        let home = env
            .get_template("home.html")
            .unwrap()
            .render(context! {
                messages => vec!["one", "two", "three", "four"],
                demo_files => vec!["/static/demo/ligand.sdf"],
            })
            .unwrap();
        assert!(home.contains("three"));
        assert!(home.contains(r#"href="/static/demo/ligand.sdf""#));

        let chat = env
            .get_template("chat.html")
            .unwrap()
            .render(context! { server_url => "http://dock.local:8000", message_endpoint => "/chat/message/" })
            .unwrap();
        assert!(chat.contains("pharmadock chat --server http://dock.local:8000"));
        assert!(!chat.contains("<form"));
    }

    #[test]
    fn test_directory_templates_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("home.html"), "custom {{ messages|length }}").unwrap();
        let env = environment(Some(dir.path())).unwrap();
        let out = env
            .get_template("home.html")
            .unwrap()
            .render(context! { messages => vec!["a"] })
            .unwrap();
        assert_eq!(out, "custom 1");
    }
}
