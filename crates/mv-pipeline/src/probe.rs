//! Uniformity check across downloaded sources.
//!
//! The result is advisory: the assembler always tries a stream copy first.
//! Probing never fails a run; an unreadable source simply makes the batch
//! non-uniform.

use mv_av::MediaTool;

use crate::model::SourceAsset;

/// Inspect every asset, record its descriptor and report whether all of
/// them share codec and resolution.
pub async fn classify(tool: &dyn MediaTool, assets: &mut [SourceAsset]) -> bool {
    let mut all_probed = true;

    for asset in assets.iter_mut() {
        match tool.inspect(asset.path()).await {
            Ok(descriptor) => {
                tracing::debug!("Source {} is {descriptor}", asset.position);
                asset.descriptor = Some(descriptor);
            }
            Err(e) => {
                tracing::warn!("Could not probe source {}: {e}", asset.position);
                asset.descriptor = None;
                all_probed = false;
            }
        }
    }

    let uniform = all_probed && is_uniform(assets);
    if uniform {
        tracing::info!("All {} sources share codec and resolution", assets.len());
    } else {
        let summary: Vec<String> = assets
            .iter()
            .map(|a| {
                a.descriptor
                    .as_ref()
                    .map_or_else(|| "unknown".to_string(), ToString::to_string)
            })
            .collect();
        tracing::info!("Sources are not uniform: [{}]", summary.join(", "));
    }
    uniform
}

fn is_uniform(assets: &[SourceAsset]) -> bool {
    let mut descriptors = assets.iter().map(|a| a.descriptor.as_ref());
    match descriptors.next() {
        Some(Some(first)) => descriptors.all(|d| d == Some(first)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{write_asset, FakeTool};

    #[tokio::test]
    async fn identical_sources_are_uniform() {
        let dir = tempfile::tempdir().unwrap();
        let tool = FakeTool::new();
        let mut assets = vec![
            write_asset(dir.path(), 1, "h264:1920x1080", b"one"),
            write_asset(dir.path(), 2, "h264:1920x1080", b"two"),
        ];

        assert!(classify(&tool, &mut assets).await);
        assert_eq!(
            assets[0].descriptor.as_ref().unwrap().to_string(),
            "h264:1920x1080"
        );
    }

    #[tokio::test]
    async fn resolution_mismatch_is_not_uniform() {
        let dir = tempfile::tempdir().unwrap();
        let tool = FakeTool::new();
        let mut assets = vec![
            write_asset(dir.path(), 1, "h264:1920x1080", b"one"),
            write_asset(dir.path(), 2, "h264:1280x720", b"two"),
        ];

        assert!(!classify(&tool, &mut assets).await);
        assert!(assets.iter().all(|a| a.descriptor.is_some()));
    }

    #[tokio::test]
    async fn probe_failure_is_not_uniform() {
        let dir = tempfile::tempdir().unwrap();
        let tool = FakeTool::new();
        let mut assets = vec![
            write_asset(dir.path(), 1, "h264:1920x1080", b"one"),
            write_asset(dir.path(), 2, "garbage", b"two"),
        ];

        assert!(!classify(&tool, &mut assets).await);
        assert!(assets[1].descriptor.is_none());
    }
}
