//! Command implementations.

use std::io::Write;

use anyhow::{anyhow, Context, Result};

use super::args::{Command, ResolveArgs, SceneArgs};
use crate::config::ResolverConfig;
use crate::lua::Scene;
use crate::pipeline::{FormLookup, LoadReport};

/// Scene plus the lookup state configured against it.
pub struct Session {
    pub scene: Scene,
    pub lookup: FormLookup,
    pub report: LoadReport,
}

impl Session {
    pub fn open(args: &SceneArgs) -> Result<Self> {
        let scene = Scene::from_file(&args.scene)?;

        let mut config = ResolverConfig::default();
        for path in &args.configs {
            let loaded = ResolverConfig::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?;
            config.merge(loaded);
        }

        let mut lookup = FormLookup::new();
        let report = lookup.load_config(&config, &scene.catalog);
        Ok(Self {
            scene,
            lookup,
            report,
        })
    }
}

/// Run `command`, then flush `out` so write failures surface as errors.
pub fn run(command: &Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Resolve(args) => run_resolve(args, out)?,
        Command::Check(args) => run_check(args, out)?,
    }
    out.flush().context("Failed to write output")
}

pub fn run_resolve(args: &ResolveArgs, out: &mut impl Write) -> Result<()> {
    let session = Session::open(&args.scene)?;
    let resolver = session
        .lookup
        .resolver(&session.scene.catalog, &session.scene.runtime);

    for id in &args.references {
        let reference = session
            .scene
            .reference(*id)
            .ok_or_else(|| anyhow!("Unknown reference {}", id))?;
        let resolved = resolver.resolve(reference);
        writeln!(out, "{} -> {}", id, resolved)?;
    }
    Ok(())
}

pub fn run_check(args: &SceneArgs, out: &mut impl Write) -> Result<()> {
    let session = Session::open(args)?;
    let catalog = &session.scene.catalog;
    let report = &session.report;

    writeln!(out, "sources: {}", catalog.sources().len())?;
    writeln!(out, "forms: {}", catalog.form_count())?;
    writeln!(out, "references: {}", catalog.reference_count())?;
    writeln!(out, "script classes: {}", session.scene.runtime.class_count())?;
    writeln!(out, "bound objects: {}", session.scene.runtime.bound_object_count())?;
    writeln!(out, "script variables: {}", session.lookup.variables().len())?;
    writeln!(
        out,
        "remaps: {} registered, {} duplicate, {} dropped",
        report.registered,
        report.duplicates,
        report.dropped()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormId;
    use tempfile::TempDir;

    const SCENE: &str = r#"
        return {
            sources = { "Skyrim.esm", { name = "Critters.esl", light = true } },
            forms = {
                { id = 0x00012345, type = "activator" },
                { id = 0x0004DA24, type = "ingredient" },
                { id = 0x00013000, type = "flora" },
            },
            references = {
                { id = 0xFF000800, base = 0x00012345 },
                { id = 0xFF000801, base = 0x00013000 },
            },
            classes = { Critter = { variables = { vm.var("nectar") } } },
            bindings = {
                [0xFF000800] = { { class = "Critter", vars = { [vm.var("nectar")] = vm.form(0x0004DA24) } } },
            },
        }
    "#;

    const CONFIG: &str = r#"
script_variables: [nectar]
remaps:
  - base: { source: Skyrim.esm, id: "0x13000" }
    target: { source: Skyrim.esm, id: "0x4DA24" }
  - base: { source: Missing.esp, id: 1 }
    target: { source: Skyrim.esm, id: 1 }
"#;

    fn scene_args(temp: &TempDir) -> SceneArgs {
        let scene = temp.path().join("world.lua");
        let config = temp.path().join("lookup.yaml");
        std::fs::write(&scene, SCENE).unwrap();
        std::fs::write(&config, CONFIG).unwrap();
        SceneArgs {
            scene,
            configs: vec![config],
        }
    }

    #[test]
    fn test_run_resolve() {
        let temp = TempDir::new().unwrap();
        let args = ResolveArgs {
            scene: scene_args(&temp),
            references: vec![FormId(0xFF00_0800), FormId(0xFF00_0801)],
        };
        let mut out = Vec::new();

        run_resolve(&args, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "0xFF000800 -> 0x0004DA24\n0xFF000801 -> 0x0004DA24\n");
    }

    #[test]
    fn test_run_resolve_unknown_reference() {
        let temp = TempDir::new().unwrap();
        let args = ResolveArgs {
            scene: scene_args(&temp),
            references: vec![FormId(0x1234)],
        };

        let err = run_resolve(&args, &mut Vec::<u8>::new()).unwrap_err();
        assert!(err.to_string().contains("Unknown reference 0x00001234"));
    }

    #[test]
    fn test_run_check() {
        let temp = TempDir::new().unwrap();
        let mut out = Vec::new();

        run_check(&scene_args(&temp), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("sources: 2\n"));
        assert!(text.contains("references: 2\n"));
        assert!(text.contains("script variables: 1\n"));
        assert!(text.contains("remaps: 1 registered, 0 duplicate, 1 dropped\n"));
    }

    struct UnflushableOutput(Vec<u8>);

    impl Write for UnflushableOutput {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_run_reports_flush_failure() {
        let temp = TempDir::new().unwrap();
        let command = Command::Check(scene_args(&temp));
        let mut out = UnflushableOutput(Vec::new());

        let err = run(&command, &mut out).unwrap_err();

        assert!(err.to_string().contains("Failed to write output"));
        assert!(String::from_utf8_lossy(&out.0).contains("sources: 2\n"));
    }

    #[test]
    fn test_run_flushes_after_command() {
        let temp = TempDir::new().unwrap();
        let command = Command::Check(scene_args(&temp));
        let mut out = Vec::new();

        run(&command, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("sources: 2\n"));
    }

    #[test]
    fn test_bad_config_path_has_context() {
        let temp = TempDir::new().unwrap();
        let mut args = scene_args(&temp);
        args.configs.push(temp.path().join("missing.yaml"));

        let err = run_check(&args, &mut Vec::<u8>::new()).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }
}
