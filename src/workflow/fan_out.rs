//! 有界有序扇出
//!
//! 把一组工作单元交给同一个异步调用，同时进行中的单元不超过上限，
//! 结果按单元原始顺序返回。失败的单元被跳过，全部失败才算失败。

use futures::stream::{self, StreamExt};
use std::future::Future;
use tracing::{debug, warn};

use crate::error::{GenerateError, WorkerError};
use crate::utils::logging::{log_fan_out_complete, truncate_text};
use crate::workflow::RequestCtx;

/// 执行扇出
///
/// # 参数
/// - `ctx`: 请求上下文
/// - `units`: 工作单元，顺序即结果顺序
/// - `max_in_flight`: 同时进行中的单元上限（0 按 1 处理）
/// - `run`: 处理单个单元
///
/// # 返回
/// 成功单元的结果（保持原顺序）；所有单元都失败时返回 `AllUnitsFailed`
pub async fn fan_out<U, T, F, Fut>(
    ctx: &RequestCtx,
    units: Vec<U>,
    max_in_flight: usize,
    run: F,
) -> Result<Vec<T>, GenerateError>
where
    F: Fn(U) -> Fut,
    Fut: Future<Output = Result<T, WorkerError>>,
{
    let total = units.len();
    let limit = max_in_flight.max(1);
    debug!("{} 开始扇出: {} 个单元, 并发上限 {}", ctx, total, limit);

    let outcomes: Vec<(usize, Result<T, WorkerError>)> = stream::iter(units.into_iter().enumerate())
        .map(|(idx, unit)| {
            let call = run(unit);
            async move { (idx, call.await) }
        })
        .buffered(limit)
        .collect()
        .await;

    let mut results = Vec::with_capacity(total);
    let mut last_error = None;
    for (idx, outcome) in outcomes {
        match outcome {
            Ok(value) => results.push(value),
            Err(err) => {
                warn!(
                    "{} 第 {}/{} 个单元失败，已跳过: {}",
                    ctx,
                    idx + 1,
                    total,
                    truncate_text(&err.to_string(), 200)
                );
                last_error = Some(err);
            }
        }
    }

    match last_error {
        Some(last) if results.is_empty() => Err(GenerateError::AllUnitsFailed {
            feature: ctx.feature,
            attempted: total,
            last,
        }),
        _ => {
            log_fan_out_complete(&ctx.to_string(), results.len(), total);
            Ok(results)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{FeatureId, WorkerKind, WorkerOutput, WorkerPayload, WorkerRequest};
    use crate::services::WorkerPipeline;
    use crate::testing::ScriptedWorker;
    use std::time::Duration;

    fn illustration_pipeline(worker: std::sync::Arc<ScriptedWorker>) -> WorkerPipeline {
        let mut pipeline = WorkerPipeline::new();
        pipeline.register(WorkerKind::Illustrator, worker);
        pipeline
    }

    fn image_for(request: &WorkerRequest) -> WorkerOutput {
        WorkerOutput::new(format!(r#"{{"image_data":"img:{}"}}"#, request.text))
    }

    async fn run_units(
        pipeline: &WorkerPipeline,
        units: Vec<String>,
        limit: usize,
    ) -> Result<Vec<String>, GenerateError> {
        let ctx = RequestCtx::new(1, FeatureId::Visualization);
        fan_out(&ctx, units, limit, |unit| async move {
            match pipeline
                .invoke(WorkerKind::Illustrator, &WorkerRequest::text(unit))
                .await?
            {
                WorkerPayload::Illustration(image) => Ok(image.image_data),
                other => Err(WorkerError::malformed_output(format!("{:?}", other))),
            }
        })
        .await
    }

    fn units(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("segment {}", i)).collect()
    }

    #[tokio::test]
    async fn test_failed_unit_is_dropped_and_order_kept() {
        let worker = ScriptedWorker::new(|request, _| {
            if request.text == "segment 3" {
                Err(WorkerError::process_failed("boom"))
            } else {
                Ok(image_for(request))
            }
        });
        let pipeline = illustration_pipeline(worker.clone());

        let results = run_units(&pipeline, units(5), 3).await.unwrap();
        assert_eq!(
            results,
            vec![
                "img:segment 1",
                "img:segment 2",
                "img:segment 4",
                "img:segment 5"
            ]
        );
        assert_eq!(worker.calls(), 5);
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_limit() {
        let worker =
            ScriptedWorker::with_delay(Duration::from_millis(20), |request, _| Ok(image_for(request)));
        let pipeline = illustration_pipeline(worker.clone());

        let results = run_units(&pipeline, units(7), 2).await.unwrap();
        assert_eq!(results.len(), 7);
        assert_eq!(results[6], "img:segment 7");
        // 同时进行的单元恰好达到上限，说明是并发分发而不是逐个执行
        assert_eq!(worker.max_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_zero_limit_behaves_as_one() {
        let worker =
            ScriptedWorker::with_delay(Duration::from_millis(5), |request, _| Ok(image_for(request)));
        let pipeline = illustration_pipeline(worker.clone());

        let results = run_units(&pipeline, units(3), 0).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(worker.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_all_units_failing_is_total_failure() {
        let worker = ScriptedWorker::replying("not json");
        let pipeline = illustration_pipeline(worker);

        let err = run_units(&pipeline, units(4), 3).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TotalFailure);
        match err {
            GenerateError::AllUnitsFailed {
                attempted, last, ..
            } => {
                assert_eq!(attempted, 4);
                assert_eq!(last.detail, "not json");
            }
            other => panic!("意外的错误: {:?}", other),
        }
    }
}
