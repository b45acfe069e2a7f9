use async_trait::async_trait;

use super::{Mode, Provider};
use crate::errors::EngineError;

/// Offline stand-in used whenever no real provider is usable. Output is
/// deterministic over (mode, prompt) and the adapter never fails.
pub struct Mock;

#[async_trait]
impl Provider for Mock {
    async fn complete(
        &self,
        prompt: &str,
        mode: Mode,
        _context: &str,
    ) -> Result<String, EngineError> {
        Ok(match mode {
            Mode::Chat => format!("You asked: {prompt}"),
            // No file map; the caller falls back to the default scaffold.
            Mode::Project => "{}".to_string(),
            Mode::Code => format!(
                "// Generated code based on prompt: {prompt}\n\
                 import React from 'react';\n\n\
                 const GeneratedComponent = () => {{\n\
                 \x20 return (\n\
                 \x20   <div className=\"p-4 bg-gray-100 rounded-lg\">\n\
                 \x20     <h1 className=\"text-2xl font-bold\">Hello from AI Generated Code</h1>\n\
                 \x20     <p>This is a placeholder for the actual generated code.</p>\n\
                 \x20   </div>\n\
                 \x20 );\n\
                 }};\n\n\
                 export default GeneratedComponent;\n"
            ),
        })
    }
}
