//! # Runtime Flows
//!
//! The runtime builds stages through the registry and reports through the
//! Prometheus sink. These tests wire the full chain: input lines, stage,
//! output writer, and metrics.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use pipeline_buffer::{
        Buffer, BufferConfig, BufferRegistry, ConstructionError, PassThroughBuffer,
        TransactionReceiver, TypeSpec, METRIC_FORWARDED,
    };
    use pipeline_runtime::{close_stage, PipelineRuntime, RuntimeConfig};
    use pipeline_telemetry::{PrometheusMetrics, STAGE_EVENTS_METRIC};
    use pipeline_types::{PipelineError, SharedMetrics, Transaction};
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    const STARTS_METRIC: &str = "recording_starts";

    /// Pass-through that also counts attach attempts.
    struct RecordingBuffer {
        inner: PassThroughBuffer,
        metrics: SharedMetrics,
    }

    #[async_trait]
    impl Buffer for RecordingBuffer {
        fn start_receiving(
            &self,
            inbound: mpsc::Receiver<Transaction>,
        ) -> Result<(), PipelineError> {
            self.metrics.incr(STARTS_METRIC, 1);
            self.inner.start_receiving(inbound)
        }

        fn transaction_chan(&self) -> TransactionReceiver {
            self.inner.transaction_chan()
        }

        fn stop_consuming(&self) {
            self.inner.stop_consuming();
        }

        fn close_async(&self) {
            self.inner.close_async();
        }

        async fn wait_for_close(&self, timeout: Duration) -> Result<(), PipelineError> {
            self.inner.wait_for_close(timeout).await
        }
    }

    fn recording(
        _config: &BufferConfig,
        metrics: SharedMetrics,
    ) -> Result<Box<dyn Buffer>, ConstructionError> {
        Ok(Box::new(RecordingBuffer {
            inner: PassThroughBuffer::new(metrics.clone()),
            metrics,
        }))
    }

    fn config_for(buffer_type: &str) -> RuntimeConfig {
        RuntimeConfig {
            buffer: BufferConfig {
                buffer_type: buffer_type.to_string(),
            },
            shutdown_timeout: Duration::from_secs(1),
            ..RuntimeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_runtime_reports_to_prometheus() {
        let metrics = Arc::new(PrometheusMetrics::new().unwrap());
        let runtime = PipelineRuntime::new(config_for("none"), metrics.clone());

        let mut output = Vec::new();
        let summary = runtime
            .run(
                Cursor::new(b"one\ntwo\nthree\nfour\n".to_vec()),
                &mut output,
                std::future::pending(),
            )
            .await
            .unwrap();

        assert_eq!(summary.delivered, 4);
        assert_eq!(output, b"one\ntwo\nthree\nfour\n");
        assert_eq!(metrics.get(METRIC_FORWARDED), 4);

        let exposition = metrics.gather().unwrap();
        assert!(exposition.contains(STAGE_EVENTS_METRIC));
        assert!(exposition.contains(METRIC_FORWARDED));
    }

    #[tokio::test]
    async fn test_runtime_runs_registered_variant() {
        let mut registry = BufferRegistry::with_defaults();
        registry.register(
            "recording",
            TypeSpec {
                constructor: recording,
                description: "pass-through that counts attach attempts",
            },
        );
        assert_eq!(registry.names(), ["none", "recording"]);

        let metrics = Arc::new(PrometheusMetrics::new().unwrap());
        let runtime =
            PipelineRuntime::with_registry(config_for("recording"), registry, metrics.clone());

        let mut output = Vec::new();
        let summary = runtime
            .run(Cursor::new(b"x\ny\n".to_vec()), &mut output, std::future::pending())
            .await
            .unwrap();

        assert_eq!(summary.delivered, 2);
        assert_eq!(output, b"x\ny\n");
        assert_eq!(metrics.get(STARTS_METRIC), 1);
        assert_eq!(metrics.get(METRIC_FORWARDED), 2);
    }

    #[tokio::test]
    async fn test_runtime_interrupted_mid_stream() {
        let (mut writer, reader) = tokio::io::duplex(256);
        let runtime = PipelineRuntime::new(
            config_for("none"),
            Arc::new(PrometheusMetrics::new().unwrap()),
        );

        let feed = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            writer.write_all(b"a\nb\n").await.unwrap();
            // Keep the input open past the shutdown.
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(writer);
        });

        let mut output = Vec::new();
        let shutdown = tokio::time::sleep(Duration::from_millis(100));
        let summary = runtime
            .run(tokio::io::BufReader::new(reader), &mut output, shutdown)
            .await
            .unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.delivered, 2);
        assert_eq!(output, b"a\nb\n");
        feed.abort();
    }

    #[tokio::test]
    async fn test_close_stage_on_constructed_stage() {
        let registry = BufferRegistry::with_defaults();
        let stage = registry
            .construct(
                &BufferConfig::default(),
                Arc::new(PrometheusMetrics::new().unwrap()),
            )
            .unwrap();

        let (_in_tx, in_rx) = mpsc::channel(4);
        stage.start_receiving(in_rx).unwrap();
        close_stage(stage.as_ref(), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(stage.transaction_chan().recv().await.is_none());
    }
}
