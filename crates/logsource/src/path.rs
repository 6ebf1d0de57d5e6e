//! 출력 경로 계산

use std::path::{Component, Path, PathBuf};

use crate::error::LogsourceError;

/// 변환된 규칙의 출력 경로를 계산합니다.
///
/// `sigma_path`의 `base_dir` 기준 상대 경로를 `out_dir` 아래로 옮기면서,
/// 첫 번째 디렉토리를 `sysmon`(Sysmon 변형) 또는 `builtin`으로 바꿉니다.
/// 상대 경로가 파일 이름뿐이면 `sysmon`/`builtin` 바로 아래에 둡니다.
///
/// 파일 시스템에 접근하지 않는 순수 경로 연산입니다.
///
/// ```
/// use std::path::PathBuf;
/// use logmap_logsource::build_out_path;
///
/// let out = build_out_path(
///     "/hoge/sigma",
///     "/hoge/hayabusa_rule",
///     "/hoge/sigma/builtin/security/sample.yml",
///     true,
/// )
/// .unwrap();
/// assert_eq!(out, PathBuf::from("/hoge/hayabusa_rule/sysmon/security/sample.yml"));
/// ```
///
/// # Errors
/// - `sigma_path`가 `base_dir` 아래에 있지 않으면 [`LogsourceError::PathResolution`]
pub fn build_out_path(
    base_dir: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    sigma_path: impl AsRef<Path>,
    is_sysmon_variant: bool,
) -> Result<PathBuf, LogsourceError> {
    let base_dir = base_dir.as_ref();
    let sigma_path = sigma_path.as_ref();

    let resolution_error = || LogsourceError::PathResolution {
        path: sigma_path.display().to_string(),
        base: base_dir.display().to_string(),
    };

    let relative = sigma_path
        .strip_prefix(base_dir)
        .map_err(|_| resolution_error())?;

    let components: Vec<Component<'_>> = relative
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    if components.is_empty() || components.iter().any(|c| matches!(c, Component::ParentDir)) {
        return Err(resolution_error());
    }

    // 파일 이름만 남았으면 교체할 최상위 폴더가 없음
    let rest = if components.len() > 1 {
        &components[1..]
    } else {
        &components[..]
    };

    let tree = if is_sysmon_variant { "sysmon" } else { "builtin" };
    let mut out = out_dir.as_ref().join(tree);
    out.extend(rest.iter().map(|c| c.as_os_str()));

    Ok(out)
}
