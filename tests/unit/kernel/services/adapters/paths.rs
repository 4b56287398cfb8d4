use super::*;

#[test]
fn test_get_log_dir() {
    let dir = get_log_dir();
    // 在测试环境中应该能获取到目录
    assert!(dir.is_some());
    let dir = dir.unwrap();
    assert!(dir.to_string_lossy().contains(APP_NAME));
    assert!(dir.to_string_lossy().contains(LOG_DIR));
}
