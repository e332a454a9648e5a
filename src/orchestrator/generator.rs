//! 产物生成器 - 编排层
//!
//! ## 职责
//!
//! 对外唯一入口 `generate(feature, raw_text)`：
//!
//! 1. **规范化输入**：按功能计算缓存键（词根列表 / 分片 / 折叠空白后的文本）
//! 2. **查缓存**：命中直接返回，不调用任何 worker
//! 3. **调度 worker**：整段文本调用一次，或按单词 / 分片有界扇出
//! 4. **写缓存**：只缓存成功结果
//! 5. **落盘音频**：朗读音频写入保留数量有限的目录

use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{CacheConfig, Config};
use crate::error::{AppResult, GenerateError, WorkerError};
use crate::infrastructure::ArtifactStore;
use crate::models::{
    FeatureId, FeatureResult, Narration, SegmentImage, Segmentation, Visualization, WorkerKind,
    WorkerPayload, WorkerRequest,
};
use crate::orchestrator::feature_caches::{FeatureCaches, Fingerprint};
use crate::services::WorkerPipeline;
use crate::text::{base_forms, NormalizedWord, TextSegmenter, WordNormalizer};
use crate::utils::logging::{log_startup, truncate_text};
use crate::workflow::{fan_out, RequestCtx};

/// 插图上下文保留的前文单词数
const STORY_CONTEXT_WORDS: usize = 200;

/// 生成统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorStats {
    pub cache_hits: usize,
    pub cache_misses: usize,
    /// 实际发起的 worker 调用次数（含重试）
    pub worker_invocations: usize,
}

/// 规范化后的输入
enum PreparedInput {
    /// 折叠空白后的整段文本
    Text(String),
    Words(Vec<NormalizedWord>),
    Segments(Segmentation),
}

/// 产物生成器
///
/// 持有 worker 管线和所有功能的缓存。调用方需要串行使用（`&mut self`）。
pub struct ArtifactGenerator {
    pipeline: WorkerPipeline,
    caches: FeatureCaches,
    normalizer: WordNormalizer,
    segmenter: TextSegmenter,
    audio_store: Option<ArtifactStore>,
    max_in_flight: usize,
    next_request: u64,
}

impl ArtifactGenerator {
    /// 创建生成器（不落盘音频）
    pub fn new(pipeline: WorkerPipeline, cache: &CacheConfig, max_in_flight: usize) -> Self {
        Self {
            pipeline,
            caches: FeatureCaches::new(cache),
            normalizer: WordNormalizer::new(),
            segmenter: TextSegmenter::new(),
            audio_store: None,
            max_in_flight: max_in_flight.max(1),
            next_request: 0,
        }
    }

    /// 朗读音频写入指定目录
    pub fn with_audio_store(mut self, store: ArtifactStore) -> Self {
        self.audio_store = Some(store);
        self
    }

    /// 按配置创建完整的生成器
    pub fn from_config(config: &Config) -> Self {
        log_startup(config);
        let store = ArtifactStore::new(
            &config.narration.audio_dir,
            config.narration.retention,
            "mp3",
        );
        Self::new(
            WorkerPipeline::from_config(config),
            &config.cache,
            config.max_in_flight_units,
        )
        .with_audio_store(store)
    }

    pub fn pipeline(&self) -> &WorkerPipeline {
        &self.pipeline
    }

    pub fn stats(&self) -> GeneratorStats {
        GeneratorStats {
            cache_hits: self.caches.hits(),
            cache_misses: self.caches.misses(),
            worker_invocations: self.pipeline.invocation_count(),
        }
    }

    /// 生成一个功能的产物
    ///
    /// # 参数
    /// - `feature`: 要生成的功能
    /// - `raw_text`: 原始文本
    ///
    /// # 返回
    /// 成功时返回结果（可能来自缓存）；输入为空、单次调用失败或扇出全部失败时返回错误
    pub async fn generate(
        &mut self,
        feature: FeatureId,
        raw_text: &str,
    ) -> AppResult<FeatureResult> {
        self.next_request += 1;
        let ctx = RequestCtx::new(self.next_request, feature);
        let started = Instant::now();

        let (key, input) = self.prepare(feature, raw_text);
        if input_is_empty(&input) {
            warn!("{} 输入规范化后为空", ctx);
            return Err(GenerateError::EmptyInput { feature });
        }

        if let Some(cached) = self.caches.get(&key) {
            info!("{} ✓ 命中缓存", ctx);
            return Ok(cached);
        }

        info!(
            "{} 开始生成: {}",
            ctx,
            truncate_text(&key.canonical, 60)
        );
        let result = self.produce(&ctx, input).await?;

        self.caches.put(key, result.clone());
        info!(
            "{} ✓ 生成完成，耗时 {}ms",
            ctx,
            started.elapsed().as_millis()
        );
        Ok(result)
    }

    fn prepare(&self, feature: FeatureId, raw_text: &str) -> (Fingerprint, PreparedInput) {
        let (canonical, input) = match feature {
            FeatureId::Pronunciation => {
                let words = self.normalizer.normalize(raw_text);
                (base_forms(&words).join(" "), PreparedInput::Words(words))
            }
            FeatureId::Visualization => {
                let segmentation = self.segmenter.segment(raw_text);
                (
                    format!(
                        "{}\n{}",
                        segmentation.kind,
                        segmentation.segments.join("\n\n")
                    ),
                    PreparedInput::Segments(segmentation),
                )
            }
            FeatureId::Comprehension
            | FeatureId::Syllables
            | FeatureId::Phonemes
            | FeatureId::Narration => {
                let collapsed = collapse_whitespace(raw_text);
                (collapsed.clone(), PreparedInput::Text(collapsed))
            }
        };
        (Fingerprint { feature, canonical }, input)
    }

    async fn produce(
        &self,
        ctx: &RequestCtx,
        input: PreparedInput,
    ) -> AppResult<FeatureResult> {
        match input {
            PreparedInput::Text(text) => self.produce_whole_text(ctx, text).await,
            PreparedInput::Words(words) => self.produce_pronunciation(ctx, words).await,
            PreparedInput::Segments(segmentation) => {
                self.produce_visualization(ctx, segmentation).await
            }
        }
    }

    /// 整段文本调用一次 worker
    async fn produce_whole_text(
        &self,
        ctx: &RequestCtx,
        text: String,
    ) -> AppResult<FeatureResult> {
        let feature = ctx.feature;
        let kind = feature.worker();
        let payload = self
            .pipeline
            .invoke(kind, &WorkerRequest::text(text))
            .await
            .map_err(|source| GenerateError::Worker { feature, source })?;

        let result = match payload {
            WorkerPayload::Questions(set) => {
                debug!("{} 收到 {} 道题", ctx, set.questions.len());
                FeatureResult::Comprehension(set)
            }
            WorkerPayload::Syllables(words) => FeatureResult::Syllables(words),
            WorkerPayload::Phonemes(words) => FeatureResult::Phonemes(words),
            WorkerPayload::Audio(audio) => {
                let file = self.persist_audio(ctx, &audio).await;
                FeatureResult::Narration(Narration { audio, file })
            }
            other => {
                return Err(GenerateError::Worker {
                    feature,
                    source: unexpected_payload(kind, &other),
                })
            }
        };
        Ok(result)
    }

    /// 逐词查词典，查不到的词省略
    async fn produce_pronunciation(
        &self,
        ctx: &RequestCtx,
        words: Vec<NormalizedWord>,
    ) -> AppResult<FeatureResult> {
        let pipeline = &self.pipeline;
        let units: Vec<String> = words.into_iter().map(|w| w.surface).collect();

        let entries = fan_out(ctx, units, self.max_in_flight, |word| async move {
            match pipeline
                .invoke(WorkerKind::DictionaryLookup, &WorkerRequest::text(word))
                .await?
            {
                WorkerPayload::WordEntry(entry) => Ok(entry),
                other => Err(unexpected_payload(WorkerKind::DictionaryLookup, &other)),
            }
        })
        .await?;

        let found: Vec<_> = entries.into_iter().flatten().collect();
        debug!("{} 词典收录 {} 个单词", ctx, found.len());
        Ok(FeatureResult::Pronunciation(found))
    }

    /// 逐个分片生成插图，每个分片带上前文作为上下文
    async fn produce_visualization(
        &self,
        ctx: &RequestCtx,
        segmentation: Segmentation,
    ) -> AppResult<FeatureResult> {
        let pipeline = &self.pipeline;
        let kind = segmentation.kind;
        let contexts = story_contexts(&segmentation.segments, STORY_CONTEXT_WORDS);
        let units: Vec<(String, Option<String>)> =
            segmentation.segments.into_iter().zip(contexts).collect();

        let results = fan_out(
            ctx,
            units,
            self.max_in_flight,
            |(segment, context)| async move {
                let request = WorkerRequest {
                    text: segment.clone(),
                    segment_kind: Some(kind),
                    context,
                    question_count: None,
                };
                match pipeline.invoke(WorkerKind::Illustrator, &request).await? {
                    WorkerPayload::Illustration(image) => Ok(SegmentImage {
                        segment,
                        image_data: image.image_data,
                        segment_type: kind,
                    }),
                    other => Err(unexpected_payload(WorkerKind::Illustrator, &other)),
                }
            },
        )
        .await?;

        Ok(FeatureResult::Visualization(Visualization {
            segment_kind: kind,
            results,
        }))
    }

    /// 写盘失败不影响返回音频
    async fn persist_audio(&self, ctx: &RequestCtx, audio: &[u8]) -> Option<std::path::PathBuf> {
        let store = self.audio_store.as_ref()?;
        match store.save(audio).await {
            Ok(path) => {
                info!("{} 🔊 音频已保存: {}", ctx, path.display());
                Some(path)
            }
            Err(e) => {
                warn!(
                    "{} 音频写入失败 ({}): {}",
                    ctx,
                    store.dir().display(),
                    e
                );
                None
            }
        }
    }
}

fn input_is_empty(input: &PreparedInput) -> bool {
    match input {
        PreparedInput::Text(text) => text.is_empty(),
        PreparedInput::Words(words) => words.is_empty(),
        PreparedInput::Segments(segmentation) => segmentation.is_empty(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 每个分片之前所有分片的最后 `max_words` 个单词；第一个分片没有上下文
fn story_contexts(segments: &[String], max_words: usize) -> Vec<Option<String>> {
    let mut preceding: Vec<&str> = Vec::new();
    let mut contexts = Vec::with_capacity(segments.len());
    for segment in segments {
        if preceding.is_empty() {
            contexts.push(None);
        } else {
            let start = preceding.len().saturating_sub(max_words);
            contexts.push(Some(preceding[start..].join(" ")));
        }
        preceding.extend(segment.split_whitespace());
    }
    contexts
}

fn unexpected_payload(expected: WorkerKind, payload: &WorkerPayload) -> WorkerError {
    WorkerError::malformed_output(format!(
        "{} 返回了 {} 的结果",
        expected,
        payload.kind()
    ))
}
