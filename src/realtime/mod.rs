//! Real-time event streaming
//! 资源变更推送（SSE），按医院过滤

use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::AppError;

/// 实时事件类型
#[derive(Debug, Clone)]
pub enum RealtimeEvent {
    /// 资源发生变更（创建、更新或删除）
    ResourceChanged {
        hospital_id: Uuid,
        action: ResourceAction,
        resource: serde_json::Value,
    },
    /// 心跳信号（保持连接活跃）
    Heartbeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceAction {
    Create,
    Update,
    Delete,
}

impl ResourceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceAction::Create => "create",
            ResourceAction::Update => "update",
            ResourceAction::Delete => "delete",
        }
    }
}

impl RealtimeEvent {
    /// 转换为SSE的data载荷。删除事件只携带资源 id
    pub fn to_sse_data(&self) -> String {
        match self {
            RealtimeEvent::ResourceChanged {
                hospital_id,
                action,
                resource,
            } => {
                let mut data = serde_json::json!({
                    "type": action.as_str(),
                    "hospitalId": hospital_id,
                });
                match action {
                    ResourceAction::Delete => data["resourceId"] = resource["id"].clone(),
                    _ => data["resource"] = resource.clone(),
                }
                data.to_string()
            }
            RealtimeEvent::Heartbeat => serde_json::json!({
                "type": "heartbeat",
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })
            .to_string(),
        }
    }

    /// 获取事件类型名称
    pub fn event_type(&self) -> &str {
        match self {
            RealtimeEvent::ResourceChanged { .. } => "resourceUpdated",
            RealtimeEvent::Heartbeat => "heartbeat",
        }
    }
}

/// 单个 SSE 帧：event 行、data 行、空行
fn sse_frame(event: &str, data: &str) -> String {
    format!("event: {}\ndata: {}\n\n", event, data)
}

/// 事件总线
#[derive(Clone)]
pub struct EventBus {
    /// 广播发送器（用于向所有订阅者发送事件）
    sender: broadcast::Sender<RealtimeEvent>,
}

impl EventBus {
    /// 创建新的事件总线
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 发布事件。没有订阅者不算错误，推送是尽力而为的
    pub fn publish(&self, event: RealtimeEvent) -> Result<(), AppError> {
        if let Err(e) = self.sender.send(event) {
            tracing::debug!("No active subscribers for realtime event: {}", e);
        }
        Ok(())
    }

    /// 订阅事件
    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.sender.subscribe()
    }

    /// 订阅特定医院的资源事件
    pub fn subscribe_to_hospital(&self, hospital_id: Uuid) -> HospitalEventStream {
        HospitalEventStream::new(self.subscribe(), hospital_id)
    }
}

/// 医院事件流（只转发该医院的资源事件）
pub struct HospitalEventStream {
    receiver: broadcast::Receiver<RealtimeEvent>,
    hospital_id: Uuid,
}

impl HospitalEventStream {
    fn new(receiver: broadcast::Receiver<RealtimeEvent>, hospital_id: Uuid) -> Self {
        Self {
            receiver,
            hospital_id,
        }
    }

    /// 转换为SSE流
    pub async fn to_sse_stream(
        self,
    ) -> Result<impl futures::Stream<Item = Result<String, AppError>>, AppError> {
        self.into_sse_stream(Duration::from_secs(30)).await
    }

    async fn into_sse_stream(
        mut self,
        heartbeat_period: Duration,
    ) -> Result<impl futures::Stream<Item = Result<String, AppError>>, AppError> {
        let (tx, rx) = tokio::sync::mpsc::channel(100);

        // 心跳定时器。首跳延后一个周期，心跳帧同样遵循 SSE 分帧
        let heartbeat_tx = tx.clone();
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + heartbeat_period;
            let mut interval = tokio::time::interval_at(start, heartbeat_period);
            loop {
                interval.tick().await;
                let frame = sse_frame("heartbeat", &RealtimeEvent::Heartbeat.to_sse_data());
                if heartbeat_tx.send(Ok(frame)).await.is_err() {
                    break;
                }
            }
        });

        // 事件转发任务
        tokio::spawn(async move {
            while let Ok(event) = self.receiver.recv().await {
                // 只转发本医院的事件
                let should_send = match &event {
                    RealtimeEvent::ResourceChanged { hospital_id, .. } => {
                        hospital_id == &self.hospital_id
                    }
                    RealtimeEvent::Heartbeat => true,
                };

                if should_send {
                    let frame = sse_frame(event.event_type(), &event.to_sse_data());
                    if tx.send(Ok(frame)).await.is_err() {
                        break;
                    }
                }
            }
        });

        let stream = tokio_stream::wrappers::ReceiverStream::new(rx);
        Ok(stream)
    }
}
