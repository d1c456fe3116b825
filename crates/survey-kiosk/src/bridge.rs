use anyhow::{Context, Result};
use survey_wizard::{Intent, SessionSnapshot, WizardController, WizardRuntime};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

const INTENT_QUEUE: usize = 64;

/// Drives a controller from JSON-lines intents on `input`, writing one
/// JSON snapshot per line to `output`. Returns once `input` hits EOF and
/// every queued intent has been applied.
pub async fn run_bridge<R, W>(
    controller: WizardController,
    input: R,
    mut output: W,
) -> Result<WizardController>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin,
{
    let (intent_tx, intent_rx) = mpsc::channel(INTENT_QUEUE);
    let (snapshot_tx, mut snapshot_rx) = mpsc::unbounded_channel::<SessionSnapshot>();

    let reader = tokio::spawn(read_intents(input, intent_tx));
    let runtime = WizardRuntime::new(controller, intent_rx, snapshot_tx);
    let writer = async move {
        while let Some(snapshot) = snapshot_rx.recv().await {
            let mut line = serde_json::to_vec(&snapshot).context("encode snapshot")?;
            line.push(b'\n');
            output.write_all(&line).await.context("write snapshot")?;
            output.flush().await.context("flush snapshot")?;
        }
        Ok::<_, anyhow::Error>(())
    };

    let (controller, written) = tokio::join!(runtime.run(), writer);
    written?;
    let read = reader.await.context("intent reader task panicked")?;
    read?;
    info!("input closed, wizard stopped");
    Ok(controller)
}

async fn read_intents<R>(input: R, intents: mpsc::Sender<Intent>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("read intent line")? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Intent>(trimmed) {
            Ok(intent) => {
                if intents.send(intent).await.is_err() {
                    break;
                }
            }
            Err(err) => warn!(error = %err, line = trimmed, "ignoring malformed intent"),
        }
    }
    Ok(())
}
