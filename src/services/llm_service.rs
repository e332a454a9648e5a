//! LLM 出题服务 - 业务能力层
//!
//! 只负责"根据一段文本生成阅读理解选择题"能力，以进程内 worker 的形式接入管线。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Gemini 的 OpenAI 兼容端点）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::WorkerError;
use crate::infrastructure::Worker;
use crate::models::{WorkerOutput, WorkerRequest};

const SYSTEM_MESSAGE: &str = "You write reading comprehension questions for young readers. \
                              Reply with JSON only.";

/// LLM 出题服务
///
/// 职责：
/// - 计算题目数量并构建 prompt
/// - 调用 LLM API
/// - 去掉回复外层的 Markdown 代码块，原样交给管线校验
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    chars_per_question: usize,
    max_questions: usize,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &LlmConfig) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.model_name.clone(),
            chars_per_question: config.chars_per_question.max(1),
            max_questions: config.max_questions.max(1),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（已去除首尾空白）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String, WorkerError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| WorkerError::launch_failed(format!("构建系统消息失败: {}", e)))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| WorkerError::launch_failed(format!("构建用户消息失败: {}", e)))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(4096u32)
            .build()
            .map_err(|e| WorkerError::launch_failed(format!("构建 LLM 请求失败: {}", e)))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            WorkerError::process_failed(format!("LLM API 调用失败: {}", e))
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| WorkerError::malformed_output("LLM 返回内容为空"))?;

        Ok(content.trim().to_string())
    }

    /// 按文本长度决定题目数量：每 `chars_per_question` 个字符一道，至少 1 道，至多 `max_questions` 道
    pub fn question_count(&self, text: &str) -> usize {
        let chars = text.chars().count();
        chars
            .div_ceil(self.chars_per_question)
            .clamp(1, self.max_questions)
    }
}

#[async_trait]
impl Worker for LlmService {
    async fn call(&self, request: &WorkerRequest) -> Result<WorkerOutput, WorkerError> {
        let count = request
            .question_count
            .unwrap_or_else(|| self.question_count(&request.text));
        let prompt = build_question_prompt(&request.text, count);

        let response = self.send_to_llm(&prompt, Some(SYSTEM_MESSAGE)).await?;
        Ok(WorkerOutput::new(strip_code_fence(&response)))
    }

    fn describe(&self) -> String {
        format!("llm:{}", self.model_name)
    }
}

/// 构建出题 prompt
fn build_question_prompt(text: &str, count: usize) -> String {
    format!(
        r#"Generate exactly {count} multiple-choice comprehension questions for the following text: {text}
The questions should cover different aspects of the text and vary in difficulty.
Format the output as follows:
{{
  "questions": [
    {{
      "question": "What is the main idea of the text?",
      "choices": [
        {{ "text": "Choice A", "isCorrect": false }},
        {{ "text": "Choice B", "isCorrect": true }},
        {{ "text": "Choice C", "isCorrect": false }},
        {{ "text": "Choice D", "isCorrect": false }}
      ]
    }}
  ]
}}"#
    )
}

/// 去掉 ```json ... ``` 包裹
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> LlmService {
        LlmService::new(&LlmConfig::default())
    }

    #[test]
    fn test_question_count_bounds() {
        let service = create_test_service();
        assert_eq!(service.question_count(""), 1);
        assert_eq!(service.question_count(&"a".repeat(150)), 1);
        assert_eq!(service.question_count(&"a".repeat(200)), 1);
        assert_eq!(service.question_count(&"a".repeat(201)), 2);
        assert_eq!(service.question_count(&"a".repeat(1000)), 5);
        assert_eq!(service.question_count(&"a".repeat(10_000)), 15);
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[]\n```  "), "[]");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_prompt_mentions_count_and_text() {
        let prompt = build_question_prompt("Tom has a red kite.", 3);
        assert!(prompt.contains("exactly 3 multiple-choice"));
        assert!(prompt.contains("Tom has a red kite."));
        assert!(prompt.contains("\"isCorrect\": true"));
    }

    /// 测试真实 LLM 调用
    ///
    /// 运行方式：
    /// ```bash
    /// LLM_API_KEY=... cargo test test_generate_questions_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_generate_questions_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = crate::config::Config::from_env();
        let service = LlmService::new(&config.llm);
        let output = service
            .call(&WorkerRequest::text(
                "The fox ran across the snowy field to find food for her cubs.",
            ))
            .await
            .expect("LLM 调用失败");

        println!("{}", output.stdout_lossy());
        let set: crate::models::QuestionSet = serde_json::from_slice(&output.stdout).unwrap();
        assert!(set.validate().is_ok());
    }
}
