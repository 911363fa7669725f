// DOM hooks used by the web front-end.

// Controls
pub const FILE_INPUT_ID: &str = "audioInput";
pub const PLAY_BUTTON_ID: &str = "playBtn";
pub const SPEED_INPUT_ID: &str = "speed";
pub const SPEED_LABEL_ID: &str = "speedVal";
pub const REVERB_INPUT_ID: &str = "reverb";
pub const REVERB_LABEL_ID: &str = "reverbVal";
pub const STATUS_ID: &str = "status";

// Bar view
pub const VISUALIZER_ID: &str = "visualizer";
pub const BAR_CLASS: &str = "bar";
pub const BAR_IDLE_HEIGHT: &str = "2px";

// Play button is highlighted once a file is loaded
pub const ACTIVE_CLASS: &str = "active";
