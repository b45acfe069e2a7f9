use anyhow::{Context as _, Result};
use chrono::Utc;
use fs_err as fs;
use serde_json::{json, Value};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::parse::{content_str, FileMap};

/// Fixed scaffold paths in write order. Provider-supplied paths follow these.
pub const SCAFFOLD_PATHS: [&str; 7] = [
    "index.html",
    "src/main.jsx",
    "src/App.jsx",
    "src/components/Hero.jsx",
    "src/components/Features.jsx",
    "src/components/Sections.jsx",
    "package.json",
];

#[derive(Debug, Clone)]
pub struct ProjectOutput {
    pub folder: PathBuf,
    /// Scaffold files first in fixed order (minus overridden), then any
    /// additional provider paths in their original order.
    pub files: Vec<String>,
    pub file_map: FileMap,
}

/// Write the merged scaffold + provider file set into a fresh timestamped
/// directory under `<projects_root>/<owner>/`. Provider content wins on any
/// overlapping path; extra provider paths are additive.
pub fn materialize(
    projects_root: &Path,
    owner: &str,
    prompt: &str,
    generated: Option<&FileMap>,
) -> Result<ProjectOutput> {
    let folder = allocate_folder(projects_root, owner)?;
    let mut files = Vec::new();
    let mut file_map = FileMap::new();

    for (rel, content) in scaffold(prompt) {
        if generated.map(|g| g.contains_key(rel)).unwrap_or(false) {
            // Provider defines this exact path; its version wins below.
            continue;
        }
        write_file(&folder, rel, content.as_bytes())?;
        files.push(rel.to_string());
        file_map.insert(rel.to_string(), Value::String(content));
    }

    if let Some(generated) = generated {
        for (rel, value) in generated {
            let content = content_str(value);
            write_file(&folder, rel, content.as_bytes())?;
            if !files.iter().any(|f| f == rel) {
                files.push(rel.clone());
            }
            file_map.insert(rel.clone(), Value::String(content));
        }
    }

    Ok(ProjectOutput { folder, files, file_map })
}

/// Claim `<projects_root>/<owner>/project-<millis>`. The numeric suffix makes
/// name order match creation order; same-millisecond calls claim the next
/// free stamp, so two identical requests always land in distinct directories.
pub fn allocate_folder(projects_root: &Path, owner: &str) -> Result<PathBuf> {
    let base = projects_root.join(owner);
    fs::create_dir_all(&base)?;
    let mut stamp = Utc::now().timestamp_millis();
    loop {
        let folder = base.join(format!("project-{stamp}"));
        match fs::create_dir(&folder) {
            Ok(()) => return Ok(folder),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => stamp += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// The owner's most recent project directory: greatest numeric suffix among
/// `project-*` names, regardless of which request path created it.
pub fn latest_project_folder(projects_root: &Path, owner: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(projects_root.join(owner)).ok()?;
    let mut best: Option<(i64, PathBuf)> = None;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(suffix) = name.strip_prefix("project-") else { continue };
        let Ok(stamp) = suffix.parse::<i64>() else { continue };
        if best.as_ref().map(|(b, _)| stamp > *b).unwrap_or(true) {
            best = Some((stamp, entry.path()));
        }
    }
    best.map(|(_, p)| p)
}

/// Atomic write of one relative path inside a project root, creating
/// intermediate directories as needed.
pub fn write_file(root: &Path, rel: &str, content: &[u8]) -> Result<()> {
    let abs = root.join(rel);
    if let Some(parent) = abs.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = NamedTempFile::new_in(abs.parent().unwrap_or(root))?;
    fs::write(tmp.path(), content)?;
    tmp.persist(&abs)
        .with_context(|| format!("writing {}", abs.display()))?;
    Ok(())
}

fn scaffold(prompt: &str) -> Vec<(&'static str, String)> {
    let contents = [
        INDEX_HTML.to_string(),
        MAIN_JSX.to_string(),
        APP_JSX.to_string(),
        hero_jsx(prompt),
        FEATURES_JSX.to_string(),
        SECTIONS_JSX.to_string(),
        manifest(),
    ];
    SCAFFOLD_PATHS.into_iter().zip(contents).collect()
}

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>AI Project</title>
  </head>
  <body>
    <div id="root"></div>
    <script type="module" src="/src/main.jsx"></script>
  </body>
</html>"#;

const MAIN_JSX: &str = r#"import React from 'react'
import ReactDOM from 'react-dom/client'
import App from './App.jsx'

ReactDOM.createRoot(document.getElementById('root')).render(
  <React.StrictMode>
    <App />
  </React.StrictMode>
)"#;

const APP_JSX: &str = r#"import React from 'react'
import Hero from './components/Hero.jsx'
import Features from './components/Features.jsx'
import Sections from './components/Sections.jsx'

export default function App() {
  return (
    <div className="min-h-screen bg-gray-50">
      <Hero />
      <Features />
      <Sections />
    </div>
  )
}"#;

fn hero_jsx(prompt: &str) -> String {
    format!(
        r#"import React from 'react'

export default function Hero() {{
  return (
    <section className="bg-white">
      <div className="max-w-7xl mx-auto px-6 py-16 text-center">
        <h1 className="text-4xl font-extrabold tracking-tight sm:text-5xl">AI Built Experience</h1>
        <p className="mt-4 text-lg text-gray-600">{prompt}</p>
        <div className="mt-8 flex justify-center gap-4">
          <a className="px-6 py-3 rounded-md bg-blue-600 text-white">Get Started</a>
          <a className="px-6 py-3 rounded-md bg-gray-900 text-white">Learn More</a>
        </div>
      </div>
    </section>
  )
}}"#
    )
}

const FEATURES_JSX: &str = r#"import React from 'react'

const items = [
  { title: 'Fast', desc: 'Generate structures quickly.' },
  { title: 'Modern', desc: 'React components and sections.' },
  { title: 'Flexible', desc: 'Switch providers easily.' },
  { title: 'Extensible', desc: 'Grow to full apps.' },
]

export default function Features() {
  return (
    <section className="bg-gray-50">
      <div className="max-w-7xl mx-auto px-6 py-16">
        <h2 className="text-3xl font-bold text-center">Features</h2>
        <div className="mt-10 grid sm:grid-cols-2 lg:grid-cols-4 gap-6">
          {items.map((i) => (
            <div key={i.title} className="rounded-lg bg-white p-6 shadow">
              <div className="text-xl font-semibold">{i.title}</div>
              <div className="mt-2 text-gray-600">{i.desc}</div>
            </div>
          ))}
        </div>
      </div>
    </section>
  )
}"#;

const SECTIONS_JSX: &str = r#"import React from 'react'

export default function Sections() {
  return (
    <section className="bg-white">
      <div className="max-w-7xl mx-auto px-6 py-16 space-y-16">
        <div className="grid md:grid-cols-2 gap-8 items-center">
          <div className="space-y-3">
            <h3 className="text-2xl font-bold">Showcase</h3>
            <p className="text-gray-600">Scrollable sections to explore more.</p>
          </div>
          <div className="rounded-lg bg-gray-100 h-48" />
        </div>
        <div className="grid md:grid-cols-2 gap-8 items-center">
          <div className="rounded-lg bg-gray-100 h-48" />
          <div className="space-y-3">
            <h3 className="text-2xl font-bold">Components</h3>
            <p className="text-gray-600">Modular and reusable blocks.</p>
          </div>
        </div>
      </div>
    </section>
  )
}"#;

fn manifest() -> String {
    let pkg = json!({
        "name": "ai-project",
        "private": true,
        "version": "0.0.0",
        "type": "module",
        "scripts": {
            "dev": "vite",
            "build": "vite build",
            "preview": "vite preview"
        },
        "dependencies": {
            "react": "^18.2.0",
            "react-dom": "^18.2.0"
        },
        "devDependencies": {
            "vite": "^5.4.1",
            "@vitejs/plugin-react": "^4.3.1"
        }
    });
    serde_json::to_string_pretty(&pkg).unwrap_or_default()
}
