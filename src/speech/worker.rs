use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::SpeechError;
use crate::speech::session::SpeechRequest;
use crate::voice::scratch;
use crate::voice::tts::Synthesizer;

/// Result of preparing one request, sent back to the UI thread.
#[derive(Debug)]
pub enum WorkerReply {
    Ready { id: u64, path: PathBuf },
    Failed { id: u64, error: SpeechError },
}

/// Synthesize each request and save it to a scratch file, one at a time.
/// Runs until either side of the channel pair is dropped.
pub async fn run_speech_worker<S>(
    synthesizer: Arc<S>,
    scratch_dir: PathBuf,
    mut request_rx: mpsc::UnboundedReceiver<SpeechRequest>,
    reply_tx: mpsc::UnboundedSender<WorkerReply>,
) where
    S: Synthesizer + ?Sized,
{
    tracing::info!(dir = %scratch_dir.display(), "Speech worker online");

    while let Some(request) = request_rx.recv().await {
        let id = request.id;
        let reply = match prepare_audio(synthesizer.as_ref(), &scratch_dir, request).await {
            Ok(path) => WorkerReply::Ready { id, path },
            Err(error) => WorkerReply::Failed { id, error },
        };

        if reply_tx.send(reply).is_err() {
            break;
        }
    }

    tracing::info!("Speech worker stopped");
}

async fn prepare_audio<S>(
    synthesizer: &S,
    scratch_dir: &Path,
    request: SpeechRequest,
) -> Result<PathBuf, SpeechError>
where
    S: Synthesizer + ?Sized,
{
    let audio = synthesizer.synthesize(request.text, request.slow).await?;
    tracing::debug!(id = request.id, bytes = audio.len(), "Speech synthesized");
    scratch::write_scratch(scratch_dir, &audio).await
}
