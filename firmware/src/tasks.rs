//! タスクモジュール
//!
//! 各タスクの実装を分離して管理します。

pub mod led;
pub mod speed_sampling;

// タスク関数を再エクスポート
pub use led::led_task;
pub use speed_sampling::speed_sampling_task;
