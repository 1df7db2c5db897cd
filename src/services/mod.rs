pub mod llm;
pub mod renderer;

pub use llm::{CodeGenerator, GeminiClient, LlmError};
pub use renderer::{
    rewrite_storage_url, HttpRenderService, MergeOutcome, RenderRequest, RenderService,
    RendererError,
};
