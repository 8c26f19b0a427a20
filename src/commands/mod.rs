use omnikit::ErrorCode;

pub mod compile;
pub mod validate;

/// Root flags every subcommand sees.
pub(crate) struct GlobalArgs {
    pub warn_duplicate_definitions: bool,
}

/// Map an error code to its exit code class: user input problems exit 2,
/// selection and discovery misses exit 4, failing helpers exit 20, and
/// internal errors exit 1.
pub fn exit_code_for_error(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::ParseFileUnreadable
        | ErrorCode::ParseInvalidYaml
        | ErrorCode::ParseNotAMapping
        | ErrorCode::ParseVersionMissing
        | ErrorCode::ValidationInvalidArgument
        | ErrorCode::TransformUnknownDirective
        | ErrorCode::TransformDirectiveType
        | ErrorCode::TransformDirectiveArgument
        | ErrorCode::TransformUndefinedVariable
        | ErrorCode::TransformVariablePath
        | ErrorCode::TransformIncludeCycle => 2,
        ErrorCode::TargetNone
        | ErrorCode::TargetAmbiguous
        | ErrorCode::TargetNotFound
        | ErrorCode::TargetUnknownKind
        | ErrorCode::ExternalNotFound => 4,
        ErrorCode::ExternalFailed | ErrorCode::ExternalProtocol => 20,
        ErrorCode::InternalIoError | ErrorCode::InternalJsonError => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_problems_exit_2() {
        assert_eq!(exit_code_for_error(ErrorCode::ParseVersionMissing), 2);
        assert_eq!(exit_code_for_error(ErrorCode::TransformUndefinedVariable), 2);
    }

    #[test]
    fn selection_misses_exit_4() {
        assert_eq!(exit_code_for_error(ErrorCode::TargetAmbiguous), 4);
        assert_eq!(exit_code_for_error(ErrorCode::ExternalNotFound), 4);
    }

    #[test]
    fn failing_helpers_exit_20() {
        assert_eq!(exit_code_for_error(ErrorCode::ExternalFailed), 20);
    }

    #[test]
    fn internal_errors_exit_1() {
        assert_eq!(exit_code_for_error(ErrorCode::InternalIoError), 1);
    }
}
