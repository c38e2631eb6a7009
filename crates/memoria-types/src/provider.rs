//! Text-generation trait consumed by the memory core.

use crate::{ContextEntry, ProviderError};
use std::future::Future;
use std::pin::Pin;

/// A boxed future resolving to generated text.
pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ProviderError>> + Send + 'a>>;

/// Receives text deltas as a streamed reply arrives.
pub type DeltaSink<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Trait for text-generation providers (OpenAI-compatible APIs, test doubles, ...).
///
/// Failures come back as an explicit `Result`; callers decide whether to
/// surface or absorb them. Dyn-compatible so sessions can hold
/// `Arc<dyn TextGenerator>`.
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for a single prompt.
    fn generate_text<'a>(
        &'a self,
        prompt: &'a str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> GenerateFuture<'a>;

    /// Generate a reply for a role-tagged conversation.
    ///
    /// The default flattens the entries into one transcript prompt. Providers
    /// with a native chat endpoint should override this.
    fn chat<'a>(
        &'a self,
        entries: &'a [ContextEntry],
        temperature: f32,
        max_output_tokens: u32,
    ) -> GenerateFuture<'a> {
        Box::pin(async move {
            let mut prompt = String::new();
            for entry in entries {
                prompt.push_str(entry.role.label());
                prompt.push_str(": ");
                prompt.push_str(&entry.content);
                prompt.push('\n');
            }
            prompt.push_str("ASSISTANT:");
            self.generate_text(&prompt, temperature, max_output_tokens)
                .await
        })
    }

    /// Like [`chat`](Self::chat), but hands each text delta to `on_delta`
    /// as it arrives. Resolves to the full accumulated reply.
    ///
    /// The default delivers the whole reply as a single delta.
    fn chat_stream<'a>(
        &'a self,
        entries: &'a [ContextEntry],
        temperature: f32,
        max_output_tokens: u32,
        on_delta: DeltaSink<'a>,
    ) -> GenerateFuture<'a> {
        Box::pin(async move {
            let reply = self.chat(entries, temperature, max_output_tokens).await?;
            if !reply.is_empty() {
                on_delta(&reply);
            }
            Ok(reply)
        })
    }

    /// Provider name for logging/display (e.g., "openai").
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use std::sync::{Arc, Mutex};

    struct EchoGenerator {
        prompts: Mutex<Vec<String>>,
    }

    impl TextGenerator for EchoGenerator {
        fn generate_text<'a>(
            &'a self,
            prompt: &'a str,
            _temperature: f32,
            _max_output_tokens: u32,
        ) -> GenerateFuture<'a> {
            Box::pin(async move {
                self.prompts.lock().unwrap().push(prompt.to_string());
                Ok("echo".to_string())
            })
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn generator_is_dyn_compatible() {
        // Compile-time check: TextGenerator can be used as a trait object.
        fn _accept(_g: &dyn TextGenerator) {}
    }

    #[test]
    fn arc_generator_is_send_sync() {
        fn _assert_send_sync<T: Send + Sync>() {}
        _assert_send_sync::<Arc<dyn TextGenerator>>();
    }

    #[tokio::test]
    async fn default_chat_flattens_entries() {
        let generator = EchoGenerator {
            prompts: Mutex::new(Vec::new()),
        };
        let entries = vec![
            ContextEntry::new(Role::System, "Be brief."),
            ContextEntry::new(Role::User, "Hi"),
        ];
        let reply = generator.chat(&entries, 0.7, 100).await.unwrap();
        assert_eq!(reply, "echo");

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts[0], "SYSTEM: Be brief.\nUSER: Hi\nASSISTANT:");
    }

    #[tokio::test]
    async fn default_chat_stream_delivers_one_delta() {
        let generator = EchoGenerator {
            prompts: Mutex::new(Vec::new()),
        };
        let entries = vec![ContextEntry::new(Role::User, "Hi")];
        let mut deltas = Vec::new();
        let mut sink = |delta: &str| deltas.push(delta.to_string());

        let reply = generator
            .chat_stream(&entries, 0.7, 100, &mut sink)
            .await
            .unwrap();

        assert_eq!(reply, "echo");
        assert_eq!(deltas, vec!["echo"]);
    }
}
