use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use serde_json::Value as Json;
use tabstream_api::{DecodeError, DecodePolicy, ResultTable};

use crate::sequencer::Sequencer;

/// Async counterpart of [`Decoder`](crate::Decoder): drives a
/// [`Sequencer`] from a stream of frame elements.
///
/// The only suspension point is the source stream. Dropping the
/// `DecodeStream` discards any partially assembled tables.
pub struct DecodeStream<S> {
    frames: S,
    sequencer: Sequencer,
}

impl<S> DecodeStream<S>
where
    S: Stream<Item = Json> + Unpin,
{
    pub fn new(frames: S, policy: DecodePolicy) -> Self {
        Self { frames, sequencer: Sequencer::new(policy) }
    }

    /// Dataset status and warnings, once the stream has ended.
    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }
}

impl<S> Stream for DecodeStream<S>
where
    S: Stream<Item = Json> + Unpin,
{
    type Item = Result<ResultTable, DecodeError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        while !this.sequencer.is_finished() {
            let element = futures::ready!(Pin::new(&mut this.frames).poll_next(cx));
            if let Some(item) = this.sequencer.feed(element.as_ref()) {
                return Poll::Ready(Some(item));
            }
        }
        Poll::Ready(None)
    }
}

/// Decode a stream of frame elements.
pub fn decode_stream<S>(frames: S, policy: DecodePolicy) -> DecodeStream<S>
where
    S: Stream<Item = Json> + Unpin,
{
    DecodeStream::new(frames, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn yields_tables_then_status() {
        let frames = futures::stream::iter(vec![
            json!({"FrameType": "DataSetHeader", "Version": "v2.0", "IsProgressive": true}),
            json!({"FrameType": "TableHeader", "TableId": 1, "TableKind": "PrimaryResult",
                   "TableName": "PrimaryResult",
                   "Columns": [{"ColumnName": "s", "ColumnType": "string"}]}),
            json!({"FrameType": "TableFragment", "TableId": 1, "TableFragmentType": "DataAppend",
                   "Rows": [["a"], [null]]}),
            json!({"FrameType": "TableCompletion", "TableId": 1, "RowCount": 2}),
            json!({"FrameType": "DataSetCompletion", "HasErrors": true, "Cancelled": false,
                   "OneApiErrors": ["partial failure"]}),
        ]);
        let mut stream = decode_stream(frames, DecodePolicy::default());

        let table = stream.next().await.unwrap().unwrap();
        assert!(table.is_primary());
        assert_eq!(table.table.rows.len(), 2);
        assert!(table.table.rows[1].0[0].is_null());
        assert!(stream.next().await.is_none());

        let status = stream.sequencer().status().unwrap();
        assert_eq!(
            status,
            Err(DecodeError::DataSet { cancelled: false, errors: vec!["partial failure".into()] })
        );
    }

    #[tokio::test]
    async fn truncated_source() {
        let frames = futures::stream::iter(Vec::<Json>::new());
        let items: Vec<_> = decode_stream(frames, DecodePolicy::default()).collect().await;
        assert_eq!(items, vec![Err(DecodeError::TruncatedStream)]);
    }
}
