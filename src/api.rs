use crate::ast::Group;
use crate::collision::{detect_collisions, CollisionReport};
use crate::config::{BuildConfig, CustomConfig};
use crate::error::{LoadError, ResolverError, TokenError, ValidationError};
use crate::format::{
    resolve_tokens, Css, Figma, Format, FormatOptions, JavaScript, Json, Markdown, ResolvedSet,
    Scss, TypeScript,
};
use crate::store::{expand_patterns, SourceCache, SourceSet, TokenIndex};
use crate::validator::{validate, ValidationReport};
use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Everything learned about one set of token sources: the per-file trees,
/// the merged tree and its index, and the issues found in them.
pub struct Analysis {
    pub sources: SourceSet,
    pub tree: Group,
    pub index: TokenIndex,
    pub report: ValidationReport,
    pub collisions: CollisionReport,
}

impl Analysis {
    /// Fails when any error-level issue was found.
    pub fn check(&self) -> Result<(), TokenError> {
        let errors = self.report.error_count();
        if errors > 0 {
            return Err(TokenError::ValidationFailed { errors });
        }
        Ok(())
    }

    /// Fails when two files define the same path with different values.
    pub fn check_collisions(&self) -> Result<(), TokenError> {
        let conflicts = self.collisions.conflict_count();
        if conflicts > 0 {
            return Err(TokenError::CollisionFailed { conflicts });
        }
        Ok(())
    }

    /// The validation gate: validation errors first, then value conflicts.
    pub fn gate(&self) -> Result<(), TokenError> {
        self.check()?;
        self.check_collisions()
    }

    /// Validation issues followed by value conflicts.
    pub fn issues(&self) -> Vec<ValidationError> {
        let mut issues = self.report.issues.clone();
        issues.extend(self.collisions.to_issues());
        issues
    }

    pub fn resolve(&self, themes: &[String]) -> Result<ResolvedSet, ResolverError> {
        resolve_tokens(&self.index, themes)
    }
}

/// The shared sources and every brand layered over them, analyzed one
/// target at a time.
pub struct ProjectAnalysis {
    /// The default target first, then each brand in name order.
    pub targets: Vec<(BuildTarget, Analysis)>,
}

impl ProjectAnalysis {
    fn base(&self) -> Option<&Analysis> {
        self.targets
            .iter()
            .find(|(target, _)| *target == BuildTarget::Default)
            .map(|(_, analysis)| analysis)
    }

    /// Validation issues of every target, each reported once, followed by
    /// value conflicts among the shared sources.
    ///
    /// A brand overriding a shared token is not a conflict.
    pub fn issues(&self) -> Vec<ValidationError> {
        let mut issues: Vec<ValidationError> = Vec::new();
        for (_, analysis) in &self.targets {
            for issue in &analysis.report.issues {
                if !issues.contains(issue) {
                    issues.push(issue.clone());
                }
            }
        }
        if let Some(base) = self.base() {
            issues.extend(base.collisions.to_issues());
        }
        issues
    }

    pub fn token_count(&self) -> usize {
        self.targets.iter().map(|(_, analysis)| analysis.index.len()).sum()
    }

    /// Fails on validation errors in any target, then on value conflicts
    /// among the shared sources.
    pub fn gate(&self) -> Result<(), TokenError> {
        let errors = self.issues().iter().filter(|i| i.is_error()).count();
        if errors > 0 {
            return Err(TokenError::ValidationFailed { errors });
        }
        self.check_collisions()
    }

    /// Fails on value conflicts among the shared sources.
    pub fn check_collisions(&self) -> Result<(), TokenError> {
        match self.base() {
            Some(base) => base.check_collisions(),
            None => Ok(()),
        }
    }
}

/// Merges, validates and collision-checks a source set.
///
/// The merge used for building and the per-file collision pass read the
/// same inputs independently.
pub fn analyze(sources: SourceSet) -> Analysis {
    let tree = sources.merged();
    let index = TokenIndex::from_group(&tree);
    let report = validate(&sources, &index);
    let collisions = detect_collisions(&sources);
    Analysis {
        sources,
        tree,
        index,
        report,
        collisions,
    }
}

/// Analyzes in-memory `(name, json)` documents, in merge order.
///
/// # Errors
/// Returns a `TokenError` if any document is not valid JSON.
pub fn analyze_documents<S: AsRef<str>>(documents: &[(S, S)]) -> Result<Analysis, TokenError> {
    let sources = SourceSet::from_documents(documents)?;
    Ok(analyze(sources))
}

/// Which outputs a build produces and with which prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildTarget {
    /// Every format under the configured prefix.
    Default,
    /// CSS, TypeScript and JSON under `custom/`. Without an explicit prefix
    /// the custom config file supplies one.
    Custom { prefix: Option<String> },
    /// One brand's files layered over the shared sources, under
    /// `brands/<name>/`, prefixed with the brand name.
    Brand(String),
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildTarget::Default => f.write_str("default"),
            BuildTarget::Custom { .. } => f.write_str("custom"),
            BuildTarget::Brand(name) => write!(f, "brand `{name}`"),
        }
    }
}

/// One file a build writes, relative to the target's output directory.
pub struct Output {
    pub path: PathBuf,
    pub format: Box<dyn Format>,
}

impl Output {
    fn new(path: impl Into<PathBuf>, format: impl Format + 'static) -> Self {
        Output {
            path: path.into(),
            format: Box::new(format),
        }
    }
}

/// The output directory (relative to the build root) and files of a target.
pub fn outputs_for(target: &BuildTarget) -> (PathBuf, Vec<Output>) {
    match target {
        BuildTarget::Default => (
            PathBuf::new(),
            vec![
                Output::new("css/variables.css", Css),
                Output::new("scss/_variables.scss", Scss),
                Output::new("js/tokens.js", JavaScript),
                Output::new("ts/tokens.ts", TypeScript::literal()),
                Output::new("ts/css-variables.ts", TypeScript::css_variables()),
                Output::new("json/tokens.json", Json::nested()),
                Output::new("json/tokens.flat.json", Json::flat()),
                Output::new("docs/tokens.md", Markdown),
                Output::new("figma/variables.json", Figma),
            ],
        ),
        BuildTarget::Custom { .. } => (
            PathBuf::from("custom"),
            vec![
                Output::new("variables.css", Css),
                Output::new("tokens.ts", TypeScript::literal()),
                Output::new("tokens.json", Json::nested()),
            ],
        ),
        BuildTarget::Brand(name) => (
            Path::new("brands").join(name),
            vec![
                Output::new("variables.css", Css),
                Output::new(format!("{name}.tokens.json"), Json::nested()),
                Output::new("tokens.ts", TypeScript::literal()),
            ],
        ),
    }
}

/// Renders every output of a target without touching the filesystem.
pub fn render_outputs(
    tokens: &ResolvedSet,
    outputs: &[Output],
    options: &FormatOptions,
) -> Vec<(PathBuf, String)> {
    outputs
        .iter()
        .map(|output| (output.path.clone(), output.format.render(tokens, options)))
        .collect()
}

/// Exclusive claim on an output directory for the duration of a build.
///
/// Two builds writing the same directory at once is not supported, so the
/// second one fails instead of interleaving files.
#[derive(Debug)]
pub struct BuildLock {
    path: PathBuf,
}

impl BuildLock {
    pub const FILE_NAME: &'static str = ".tokens.lock";

    pub fn acquire(dir: &Path) -> Result<Self, TokenError> {
        std::fs::create_dir_all(dir).map_err(|source| TokenError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(Self::FILE_NAME);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(BuildLock { path }),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(TokenError::BuildLocked { path })
            }
            Err(source) => Err(TokenError::Write { path, source }),
        }
    }
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            log::warn!("failed to remove {}: {err}", self.path.display());
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Build even when validation reports errors.
    pub skip_validation: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub target: BuildTarget,
    /// Absolute paths of the files written.
    pub written: Vec<PathBuf>,
    pub warnings: usize,
    /// Tokens left with unresolved references.
    pub unresolved: usize,
}

/// A token project: a root directory and its build configuration.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: BuildConfig,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, config: BuildConfig) -> Self {
        Project {
            root: root.into(),
            config,
        }
    }

    /// Opens the project whose config file is `config_path`. The file's
    /// directory is the project root; a missing file means default settings.
    pub fn open(config_path: &Path) -> Result<Self, TokenError> {
        let config = BuildConfig::load_or_default(config_path)?;
        let root = match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Project::new(root, config))
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join(&self.config.build_path)
    }

    pub fn brands_dir(&self) -> PathBuf {
        self.root.join(&self.config.brands_dir)
    }

    /// Shared sources, leaving out every brand's files.
    pub fn base_sources(&self) -> Result<Vec<PathBuf>, LoadError> {
        let brands = self.brands_dir();
        expand_patterns(&self.root, &self.config.source, Some(&brands))
    }

    /// Brand names, one per sub-directory of the brands directory.
    pub fn brand_names(&self) -> Result<Vec<String>, LoadError> {
        let dir = self.brands_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&dir).map_err(|source| LoadError::Read {
            path: dir.clone(),
            source,
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| LoadError::Read {
                path: dir.clone(),
                source,
            })?;
            if entry.path().is_dir() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Source files for a target, in merge order.
    pub fn sources_for(&self, target: &BuildTarget) -> Result<Vec<PathBuf>, LoadError> {
        let mut paths = self.base_sources()?;
        if let BuildTarget::Brand(name) = target {
            let pattern = self
                .config
                .brands_dir
                .join(name)
                .join("**")
                .join("*.json")
                .to_string_lossy()
                .to_string();
            paths.extend(expand_patterns(&self.root, &[pattern], None)?);
        }
        Ok(paths)
    }

    pub fn analyze(&self, target: &BuildTarget, cache: &mut SourceCache) -> Result<Analysis, TokenError> {
        let paths = self.sources_for(target)?;
        let sources = SourceSet::load(&paths, cache, &self.config.contexts_dir)?;
        Ok(analyze(sources))
    }

    /// Analyzes the default target and every brand.
    pub fn analyze_all(&self, cache: &mut SourceCache) -> Result<ProjectAnalysis, TokenError> {
        let mut targets = vec![(BuildTarget::Default, self.analyze(&BuildTarget::Default, cache)?)];
        for name in self.brand_names()? {
            let target = BuildTarget::Brand(name);
            let analysis = self.analyze(&target, cache)?;
            targets.push((target, analysis));
        }
        Ok(ProjectAnalysis { targets })
    }

    fn format_options(&self, target: &BuildTarget) -> Result<FormatOptions, TokenError> {
        let options = FormatOptions::from_config(&self.config);
        Ok(match target {
            BuildTarget::Default => options,
            BuildTarget::Custom { prefix: Some(prefix) } => options.with_prefix(prefix.clone()),
            BuildTarget::Custom { prefix: None } => {
                let custom = CustomConfig::load_or_default(&self.root.join(&self.config.custom_config))?;
                options.with_prefix(custom.prefix)
            }
            BuildTarget::Brand(name) => options.with_prefix(name.clone()),
        })
    }

    /// Runs one build: load, validate, resolve, render and write.
    ///
    /// Value conflicts between files are logged but do not stop the build;
    /// later files win. Use [`Analysis::gate`] to fail on them.
    ///
    /// # Errors
    /// Fails on unreadable or malformed sources, on validation errors unless
    /// `skip_validation` is set, on reference cycles, when another build
    /// holds the output directory, and on write failures.
    pub fn build(
        &self,
        target: &BuildTarget,
        options: &BuildOptions,
        cache: &mut SourceCache,
    ) -> Result<BuildSummary, TokenError> {
        let analysis = self.analyze(target, cache)?;
        let warnings = analysis.report.warning_count();
        for warning in analysis.report.warnings() {
            log::warn!("{warning}");
        }
        for conflict in analysis.collisions.to_issues() {
            log::warn!("{conflict}");
        }
        if options.skip_validation {
            let errors = analysis.report.error_count();
            if errors > 0 {
                log::warn!("building {target} despite {errors} validation error(s)");
            }
        } else {
            analysis.check()?;
        }

        let themes: Vec<String> = self.config.themes.keys().cloned().collect();
        let resolved = analysis.resolve(&themes)?;
        let format_options = self.format_options(target)?;
        let (relative_dir, outputs) = outputs_for(target);
        let rendered = render_outputs(&resolved, &outputs, &format_options);

        let out_dir = self.build_dir().join(relative_dir);
        let _lock = BuildLock::acquire(&out_dir)?;
        let mut written = Vec::with_capacity(rendered.len());
        for (path, contents) in rendered {
            let path = out_dir.join(path);
            write_file(&path, &contents)?;
            log::info!("wrote {}", path.display());
            written.push(path);
        }

        Ok(BuildSummary {
            target: target.clone(),
            written,
            warnings,
            unresolved: resolved.unresolved_count(),
        })
    }

    /// Builds every brand in turn.
    pub fn build_brands(
        &self,
        only: &[String],
        options: &BuildOptions,
        cache: &mut SourceCache,
    ) -> Result<Vec<BuildSummary>, TokenError> {
        let mut summaries = Vec::new();
        for name in self.brand_names()? {
            if !only.is_empty() && !only.contains(&name) {
                continue;
            }
            summaries.push(self.build(&BuildTarget::Brand(name), options, cache)?);
        }
        if summaries.is_empty() {
            log::warn!("no brands found under {}", self.brands_dir().display());
        }
        Ok(summaries)
    }

    /// Directories a watcher should observe: the static prefix of every
    /// source pattern, plus the brands directory.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = Vec::new();
        for pattern in &self.config.source {
            let root = glob_root(pattern);
            let root = self.root.join(root);
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        let brands = self.brands_dir();
        if brands.is_dir() && !roots.iter().any(|r| brands.starts_with(r)) {
            roots.push(brands);
        }
        roots
    }
}

fn glob_root(pattern: &str) -> PathBuf {
    Path::new(pattern)
        .components()
        .take_while(|c| {
            let text = c.as_os_str().to_string_lossy();
            !text.contains(['*', '?', '[', '{'])
        })
        .collect()
}

fn write_file(path: &Path, contents: &str) -> Result<(), TokenError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| TokenError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| TokenError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_root() {
        assert_eq!(glob_root("tokens/**/*.json"), PathBuf::from("tokens"));
        assert_eq!(glob_root("a/b/*.json"), PathBuf::from("a/b"));
        assert_eq!(glob_root("*.json"), PathBuf::new());
    }

    #[test]
    fn test_default_outputs_keep_file_names() {
        let (dir, outputs) = outputs_for(&BuildTarget::Default);
        assert_eq!(dir, PathBuf::new());
        let names: Vec<_> = outputs.iter().map(|o| o.path.to_string_lossy().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "css/variables.css",
                "scss/_variables.scss",
                "js/tokens.js",
                "ts/tokens.ts",
                "ts/css-variables.ts",
                "json/tokens.json",
                "json/tokens.flat.json",
                "docs/tokens.md",
                "figma/variables.json",
            ]
        );
    }

    #[test]
    fn test_brand_outputs() {
        let (dir, outputs) = outputs_for(&BuildTarget::Brand("acme".into()));
        assert_eq!(dir, PathBuf::from("brands/acme"));
        assert!(outputs.iter().any(|o| o.path == Path::new("acme.tokens.json")));
    }
}
