//! Dataset-level decode: frame ordering, table roles, terminal status.

use serde_json::Value as Json;
use tabstream_api::{
    DataSetCompletion, DataSetHeader, DecodeError, DecodePolicy, DecodeWarning, ResultTable, Table,
    TableRole,
};

use crate::assembler::Assembler;
use crate::classify::classify;
use crate::frame::Frame;

/// Push-driven core shared by [`Decoder`] and
/// [`DecodeStream`](crate::stream::DecodeStream).
///
/// Feed frames with [`push`](Self::push) until [`is_finished`](Self::is_finished),
/// then call [`end_of_stream`](Self::end_of_stream) if the source ran dry first.
#[derive(Debug)]
pub struct Sequencer {
    policy: DecodePolicy,
    assembler: Assembler,
    header: Option<DataSetHeader>,
    completion: Option<DataSetCompletion>,
    primary_assigned: bool,
    frames: usize,
    failed: bool,
}

impl Sequencer {
    pub fn new(policy: DecodePolicy) -> Self {
        Self {
            policy,
            assembler: Assembler::new(policy),
            header: None,
            completion: None,
            primary_assigned: false,
            frames: 0,
            failed: false,
        }
    }

    /// Consume one decoded frame element. Returns the table it finished, if any.
    ///
    /// After the first error, or after `DataSetCompletion`, every further
    /// call is rejected.
    pub fn push(&mut self, element: &Json) -> Result<Option<ResultTable>, DecodeError> {
        if self.is_finished() {
            return Err(DecodeError::MalformedFrame(
                "frame received after the decode finished".into(),
            ));
        }
        let result = self.apply(element);
        if let Err(e) = &result {
            self.failed = true;
            tracing::debug!(frame_index = self.frames, error = %e, "decode aborted");
        }
        self.frames += 1;
        result
    }

    fn apply(&mut self, element: &Json) -> Result<Option<ResultTable>, DecodeError> {
        let finished = match classify(element, &self.policy)? {
            Frame::DataSetHeader(header) => {
                if self.frames > 0 {
                    return Err(DecodeError::MalformedFrame(
                        "DataSetHeader must be the first frame".into(),
                    ));
                }
                tracing::debug!(
                    version = %header.version,
                    progressive = header.is_progressive,
                    "dataset header"
                );
                self.header = Some(header);
                None
            }
            Frame::DataTable(table) => Some(self.assembler.data_table(table)?),
            Frame::TableHeader(header) => {
                self.assembler.header(header)?;
                None
            }
            Frame::TableFragment(fragment) => {
                self.assembler.fragment(fragment)?;
                None
            }
            Frame::TableProgress(progress) => {
                self.assembler.progress(progress)?;
                None
            }
            Frame::TableCompletion(completion) => Some(self.assembler.complete(completion)?),
            Frame::DataSetCompletion(completion) => {
                self.assembler.close();
                tracing::info!(
                    has_errors = completion.has_errors,
                    cancelled = completion.cancelled,
                    errors = completion.one_api_errors.len(),
                    frames = self.frames + 1,
                    "dataset completed"
                );
                self.completion = Some(completion);
                None
            }
        };
        Ok(finished.map(|table| self.assign_role(table)))
    }

    fn assign_role(&mut self, table: Table) -> ResultTable {
        let role = if !self.primary_assigned && !table.kind.is_metadata() {
            self.primary_assigned = true;
            TableRole::Primary
        } else {
            TableRole::Metadata
        };
        tracing::debug!(
            table = table.id,
            kind = %table.kind,
            role = ?role,
            rows = table.rows.len(),
            "table finished"
        );
        ResultTable { role, table }
    }

    /// The source has no more frames.
    pub fn end_of_stream(&mut self) -> Result<(), DecodeError> {
        if self.completion.is_some() || self.failed {
            return Ok(());
        }
        self.failed = true;
        tracing::debug!(
            frames = self.frames,
            open = self.assembler.open_tables(),
            "stream truncated"
        );
        Err(DecodeError::TruncatedStream)
    }

    /// One step of a pull loop. `Some(element)` is pushed, `None` marks the
    /// end of the source. Returns what the loop should hand to its caller, if
    /// anything; the loop ends once [`is_finished`](Self::is_finished) holds.
    pub(crate) fn feed(
        &mut self,
        element: Option<&Json>,
    ) -> Option<Result<ResultTable, DecodeError>> {
        match element {
            Some(element) => self.push(element).transpose(),
            None => self.end_of_stream().err().map(Err),
        }
    }

    /// No more frames will be accepted.
    pub fn is_finished(&self) -> bool {
        self.completion.is_some() || self.failed
    }

    pub fn header(&self) -> Option<&DataSetHeader> {
        self.header.as_ref()
    }

    pub fn completion(&self) -> Option<&DataSetCompletion> {
        self.completion.as_ref()
    }

    pub fn warnings(&self) -> &[DecodeWarning] {
        self.assembler.warnings()
    }

    pub fn frames_seen(&self) -> usize {
        self.frames
    }

    /// Dataset-level status once completed: `DataSet` error when the
    /// service reported errors. `None` before completion.
    pub fn status(&self) -> Option<Result<(), DecodeError>> {
        self.completion.as_ref().map(completion_status)
    }

    pub(crate) fn take_warnings(&mut self) -> Vec<DecodeWarning> {
        self.assembler.take_warnings()
    }

    pub(crate) fn take_header(&mut self) -> Option<DataSetHeader> {
        self.header.take()
    }

    pub(crate) fn take_completion(&mut self) -> Option<DataSetCompletion> {
        self.completion.take()
    }
}

fn completion_status(completion: &DataSetCompletion) -> Result<(), DecodeError> {
    if completion.has_errors {
        return Err(DecodeError::DataSet {
            cancelled: completion.cancelled,
            errors: completion.one_api_errors.clone(),
        });
    }
    Ok(())
}

/// Lazy decode over an iterator of frame elements.
///
/// Yields each table as soon as it is finished. A structural error is
/// yielded once and ends the sequence; so does the dataset completion.
pub struct Decoder<I> {
    frames: I,
    sequencer: Sequencer,
}

impl<I> Decoder<I>
where
    I: Iterator<Item = Json>,
{
    pub fn new(frames: impl IntoIterator<IntoIter = I>, policy: DecodePolicy) -> Self {
        Self { frames: frames.into_iter(), sequencer: Sequencer::new(policy) }
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn completion(&self) -> Option<&DataSetCompletion> {
        self.sequencer.completion()
    }

    pub fn warnings(&self) -> &[DecodeWarning] {
        self.sequencer.warnings()
    }
}

impl<I> Iterator for Decoder<I>
where
    I: Iterator<Item = Json>,
{
    type Item = Result<ResultTable, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.sequencer.is_finished() {
            let element = self.frames.next();
            if let Some(item) = self.sequencer.feed(element.as_ref()) {
                return Some(item);
            }
        }
        None
    }
}

/// A fully decoded dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    pub header: Option<DataSetHeader>,
    /// Finished tables in completion order.
    pub tables: Vec<ResultTable>,
    pub completion: DataSetCompletion,
    pub warnings: Vec<DecodeWarning>,
}

impl DataSet {
    pub fn primary(&self) -> Option<&Table> {
        self.tables.iter().find(|t| t.is_primary()).map(|t| &t.table)
    }

    pub fn metadata(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter().filter(|t| !t.is_primary()).map(|t| &t.table)
    }

    /// `Err(DataSet)` when the service reported errors. The tables stay usable.
    pub fn status(&self) -> Result<(), DecodeError> {
        completion_status(&self.completion)
    }

    /// Tables only if the dataset completed without errors.
    pub fn into_result(self) -> Result<Vec<ResultTable>, DecodeError> {
        self.status()?;
        Ok(self.tables)
    }
}

/// Drain `frames` into a [`DataSet`]. Structural errors abort; a dataset
/// reporting errors is still returned, see [`DataSet::status`].
pub fn decode_all<I>(frames: I, policy: DecodePolicy) -> Result<DataSet, DecodeError>
where
    I: IntoIterator<Item = Json>,
{
    let mut decoder = Decoder::new(frames, policy);
    let tables = decoder.by_ref().collect::<Result<Vec<_>, _>>()?;

    let sequencer = &mut decoder.sequencer;
    let completion = sequencer.take_completion().ok_or(DecodeError::TruncatedStream)?;
    Ok(DataSet {
        header: sequencer.take_header(),
        tables,
        completion,
        warnings: sequencer.take_warnings(),
    })
}
