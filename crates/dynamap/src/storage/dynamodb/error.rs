//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `DatabaseError` from `dynamap_core::error`.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::delete_table::DeleteTableError;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use dynamap_core::error::DatabaseError;

/// Splits transport failures from service errors.
///
/// Modeled service errors are handed to `service`. Requests that never
/// reached DynamoDB become `ConnectionFailed`. Anything else, such as a
/// request that could not be built or a response that could not be parsed,
/// is `RequestFailed`.
fn map_sdk_error<E, R>(
    err: SdkError<E, R>,
    service: impl FnOnce(E) -> DatabaseError,
) -> DatabaseError
where
    E: std::error::Error + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    match err {
        SdkError::ServiceError(context) => service(context.into_err()),
        err @ (SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)) => {
            DatabaseError::ConnectionFailed(DisplayErrorContext(&err).to_string())
        }
        err => DatabaseError::RequestFailed(DisplayErrorContext(&err).to_string()),
    }
}

/// Map a PutItem SDK error to DatabaseError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    table: &str,
) -> DatabaseError {
    map_sdk_error(err, |err| match err {
        PutItemError::ConditionalCheckFailedException(_) => {
            DatabaseError::ConditionFailed(table.to_string())
        }
        PutItemError::ResourceNotFoundException(_) => {
            DatabaseError::TableNotFound(table.to_string())
        }
        PutItemError::ProvisionedThroughputExceededException(_) => {
            DatabaseError::Throttled("Throughput exceeded, please retry".to_string())
        }
        PutItemError::RequestLimitExceeded(_) => {
            DatabaseError::Throttled("Request limit exceeded, please retry".to_string())
        }
        PutItemError::InternalServerError(_) => {
            DatabaseError::RequestFailed("DynamoDB internal server error".to_string())
        }
        err => DatabaseError::RequestFailed(format!(
            "PutItem failed: {}",
            DisplayErrorContext(&err)
        )),
    })
}

/// Map a GetItem SDK error to DatabaseError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
    table: &str,
) -> DatabaseError {
    map_sdk_error(err, |err| match err {
        GetItemError::ResourceNotFoundException(_) => {
            DatabaseError::TableNotFound(table.to_string())
        }
        GetItemError::ProvisionedThroughputExceededException(_) => {
            DatabaseError::Throttled("Throughput exceeded, please retry".to_string())
        }
        GetItemError::RequestLimitExceeded(_) => {
            DatabaseError::Throttled("Request limit exceeded, please retry".to_string())
        }
        GetItemError::InternalServerError(_) => {
            DatabaseError::RequestFailed("DynamoDB internal server error".to_string())
        }
        err => DatabaseError::RequestFailed(format!(
            "GetItem failed: {}",
            DisplayErrorContext(&err)
        )),
    })
}

/// Map a DeleteItem SDK error to DatabaseError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
    table: &str,
) -> DatabaseError {
    map_sdk_error(err, |err| match err {
        DeleteItemError::ConditionalCheckFailedException(_) => {
            DatabaseError::ConditionFailed(table.to_string())
        }
        DeleteItemError::ResourceNotFoundException(_) => {
            DatabaseError::TableNotFound(table.to_string())
        }
        DeleteItemError::ProvisionedThroughputExceededException(_) => {
            DatabaseError::Throttled("Throughput exceeded, please retry".to_string())
        }
        DeleteItemError::RequestLimitExceeded(_) => {
            DatabaseError::Throttled("Request limit exceeded, please retry".to_string())
        }
        err => DatabaseError::RequestFailed(format!(
            "DeleteItem failed: {}",
            DisplayErrorContext(&err)
        )),
    })
}

/// Map a Scan SDK error to DatabaseError.
pub fn map_scan_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<ScanError, R>,
    table: &str,
) -> DatabaseError {
    map_sdk_error(err, |err| match err {
        ScanError::ResourceNotFoundException(_) => DatabaseError::TableNotFound(table.to_string()),
        ScanError::ProvisionedThroughputExceededException(_) => {
            DatabaseError::Throttled("Throughput exceeded, please retry".to_string())
        }
        ScanError::RequestLimitExceeded(_) => {
            DatabaseError::Throttled("Request limit exceeded, please retry".to_string())
        }
        err => DatabaseError::RequestFailed(format!("Scan failed: {}", DisplayErrorContext(&err))),
    })
}

/// Map a CreateTable SDK error to DatabaseError.
pub fn map_create_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<CreateTableError, R>,
    table: &str,
) -> DatabaseError {
    map_sdk_error(err, |err| match err {
        CreateTableError::ResourceInUseException(_) => DatabaseError::TableInUse(table.to_string()),
        CreateTableError::LimitExceededException(_) => {
            DatabaseError::Throttled("Table limit exceeded, please retry".to_string())
        }
        err => DatabaseError::RequestFailed(format!(
            "CreateTable failed: {}",
            DisplayErrorContext(&err)
        )),
    })
}

/// Map a DeleteTable SDK error to DatabaseError.
pub fn map_delete_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteTableError, R>,
    table: &str,
) -> DatabaseError {
    map_sdk_error(err, |err| match err {
        DeleteTableError::ResourceNotFoundException(_) => {
            DatabaseError::TableNotFound(table.to_string())
        }
        DeleteTableError::ResourceInUseException(_) => DatabaseError::TableInUse(table.to_string()),
        DeleteTableError::LimitExceededException(_) => {
            DatabaseError::Throttled("Table limit exceeded, please retry".to_string())
        }
        err => DatabaseError::RequestFailed(format!(
            "DeleteTable failed: {}",
            DisplayErrorContext(&err)
        )),
    })
}

/// Map a DescribeTable SDK error to DatabaseError.
///
/// Returns `None` when the table does not exist.
pub fn map_describe_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DescribeTableError, R>,
) -> Option<DatabaseError> {
    match err {
        SdkError::ServiceError(ref service)
            if matches!(service.err(), DescribeTableError::ResourceNotFoundException(_)) =>
        {
            None
        }
        err => Some(map_sdk_error(err, |err| {
            DatabaseError::RequestFailed(format!(
                "DescribeTable failed: {}",
                DisplayErrorContext(&err)
            ))
        })),
    }
}
