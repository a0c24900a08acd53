//! Landing banner: typed-text animation, then the demo complex.

use std::sync::Arc;
use std::time::Duration;

use pharmadock_common::DockingFiles;
use tracing::{error, info};

use crate::viewer::loader::{LoadSummary, ViewerLoader};
use crate::viewer::ViewerContainer;

pub const TYPE_SPEED: Duration = Duration::from_millis(50);
pub const START_DELAY: Duration = Duration::from_millis(500);
pub const BACK_DELAY: Duration = Duration::from_millis(1500);
pub const DEMO_LOAD_DELAY: Duration = Duration::from_millis(500);

pub const DEMO_RECEPTOR: &str = "demo/receptor.pdbqt";
pub const DEMO_LIGAND: &str = "demo/ligand.sdf";
pub const DEMO_POSE: &str = "demo/pose.pdbqt";

pub fn demo_files() -> DockingFiles {
    DockingFiles {
        receptor: DEMO_RECEPTOR.into(),
        ligand: DEMO_LIGAND.into(),
        pose: DEMO_POSE.into(),
    }
}

/// The four strings the banner cycles through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingMessages([String; 4]);

impl LandingMessages {
    /// `None` unless exactly four messages are given.
    pub fn new(messages: Vec<String>) -> Option<Self> {
        <[String; 4]>::try_from(messages).ok().map(Self)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

pub trait TypingSurface: Send {
    fn show(&mut self, text: &str);
}

#[derive(Debug, Clone, Copy)]
pub struct Typewriter {
    pub type_speed: Duration,
    pub start_delay: Duration,
    pub back_delay: Duration,
}

impl Default for Typewriter {
    fn default() -> Self {
        Self { type_speed: TYPE_SPEED, start_delay: START_DELAY, back_delay: BACK_DELAY }
    }
}

impl Typewriter {
    /// Type each string, pause, erase it, move on. The last one stays.
    pub async fn play(&self, surface: &mut dyn TypingSurface, strings: &[String]) {
        tokio::time::sleep(self.start_delay).await;
        for (i, text) in strings.iter().enumerate() {
            let chars: Vec<char> = text.chars().collect();
            for n in 1..=chars.len() {
                tokio::time::sleep(self.type_speed).await;
                surface.show(&chars[..n].iter().collect::<String>());
            }
            if i + 1 == strings.len() {
                break;
            }
            tokio::time::sleep(self.back_delay).await;
            for n in (0..chars.len()).rev() {
                tokio::time::sleep(self.type_speed).await;
                surface.show(&chars[..n].iter().collect::<String>());
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LandingOutcome {
    NotConfigured,
    /// Animation finished; the demo load result, `None` if it failed.
    Finished(Option<LoadSummary>),
}

pub struct LandingInitializer {
    messages: Option<LandingMessages>,
    typewriter: Typewriter,
    loader: Arc<ViewerLoader>,
    container: Arc<dyn ViewerContainer>,
    demo_delay: Duration,
}

impl LandingInitializer {
    /// `loader` should read from the static asset source.
    pub fn new(
        messages: Option<LandingMessages>,
        loader: Arc<ViewerLoader>,
        container: Arc<dyn ViewerContainer>,
    ) -> Self {
        Self { messages, typewriter: Typewriter::default(), loader, container, demo_delay: DEMO_LOAD_DELAY }
    }

    pub async fn run(&self, surface: &mut dyn TypingSurface) -> LandingOutcome {
        let Some(messages) = &self.messages else {
            error!("Landing messages are not configured");
            return LandingOutcome::NotConfigured;
        };

        self.typewriter.play(surface, messages.as_slice()).await;
        tokio::time::sleep(self.demo_delay).await;

        match self.loader.load_plain(self.container.as_ref(), &demo_files()).await {
            Ok(summary) => {
                info!(models = summary.models, "Demo molecules loaded");
                LandingOutcome::Finished(Some(summary))
            }
            Err(e) => {
                error!("Error loading demo molecules: {}", e);
                LandingOutcome::Finished(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessDocument, MapSource, RecordingSurface};
    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    const RECEPTOR: &str = "\
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  0.00  0.00    -0.079 N
ATOM      2  CA  ALA A   1      11.639   6.071  -5.147  0.00  0.00    +0.186 C
";
    const LIGAND: &str = "\
lig
  x

  1  0  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
M  END
$$$$
";
    const POSE: &str = "\
MODEL 1
HETATM    1  C   UNL     1       0.100   0.000   0.000  0.00  0.00    +0.000 C
ENDMDL
";

    fn messages() -> LandingMessages {
        LandingMessages::new(vec!["ab".into(), "c".into(), "d".into(), "e".into()]).unwrap()
    }

    fn initializer(messages: Option<LandingMessages>, source: MapSource) -> (LandingInitializer, crate::headless::HeadlessContainer) {
        let doc = HeadlessDocument::new();
        let container = doc.add_container("demo-viewer", (400, 300));
        let loader = Arc::new(ViewerLoader::new(Arc::new(doc.factory()), Arc::new(source)));
        (LandingInitializer::new(messages, loader, Arc::new(container.clone())), container)
    }

    fn demo_source() -> MapSource {
        MapSource::new()
            .with(DEMO_RECEPTOR, RECEPTOR)
            .with(DEMO_LIGAND, LIGAND)
            .with(DEMO_POSE, POSE)
    }

    #[test]
    fn test_exactly_four_messages() {
        assert!(LandingMessages::new(vec!["a".into(); 3]).is_none());
        assert!(LandingMessages::new(vec!["a".into(); 5]).is_none());
        assert_eq!(messages().as_slice().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typewriter_frames_and_timing() {
        let mut surface = RecordingSurface::default();
        let start = Instant::now();
        Typewriter::default().play(&mut surface, &["ab".to_string(), "c".to_string()]).await;

        assert_eq!(surface.frames, vec!["a", "ab", "a", "", "c"]);
        assert_eq!(start.elapsed(), Duration::from_millis(500 + 100 + 1500 + 100 + 50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_configured_does_nothing() {
        let (init, container) = initializer(None, demo_source());
        let mut surface = RecordingSurface::default();
        assert_eq!(init.run(&mut surface).await, LandingOutcome::NotConfigured);
        assert!(surface.frames.is_empty());
        assert!(container.snapshot().scene.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_loads_after_animation() {
        let (init, container) = initializer(Some(messages()), demo_source());
        let mut surface = RecordingSurface::default();
        let outcome = init.run(&mut surface).await;

        assert!(matches!(outcome, LandingOutcome::Finished(Some(s)) if s.models == 2));
        assert_eq!(surface.frames.last().map(String::as_str), Some("e"));
        let state = container.snapshot();
        assert_eq!(state.scene.unwrap().models.len(), 2);
        assert_eq!(state.overlays_shown, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_fetch_failure_is_only_logged() {
        let (init, container) = initializer(Some(messages()), demo_source().status(DEMO_POSE, 404));
        let mut surface = RecordingSurface::default();
        assert_eq!(init.run(&mut surface).await, LandingOutcome::Finished(None));
        let state = container.snapshot();
        assert!(state.errors.is_empty());
        assert_eq!(state.overlays_shown, 0);
    }
}
