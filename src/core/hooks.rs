// クロージャで組み立てるPipeline実装

use super::device::Device;
use super::traits::Pipeline;
use anyhow::Result;

type ProducerHook<C> = Box<dyn Fn(&Device, &mut C) -> Result<()> + Send + Sync>;
type ProducerWorkHook<C, I, O> = Box<dyn Fn(&Device, &mut C, I) -> Result<O> + Send + Sync>;
type ConsumerHook<C> = Box<dyn Fn(&mut C) -> Result<()> + Send + Sync>;
type ConsumerWorkHook<C, O> = Box<dyn Fn(&mut C, O) -> Result<()> + Send + Sync>;
type ConsumerEndHook<C, A> = Box<dyn Fn(&mut C) -> Result<A> + Send + Sync>;

/// 関数値の組としてフックを渡すためのPipeline
///
/// ```
/// use parallel_runner::{FnPipeline, SharedConfig};
///
/// let pipeline = FnPipeline::new(
///     |_device, _cfg: &mut SharedConfig, x: u64| Ok(x * x),
///     |cfg, y| {
///         let sum: u64 = cfg.get_or("sum", 0)?;
///         cfg.set("sum", sum + y)?;
///         Ok(())
///     },
///     |cfg| cfg.get_or("sum", 0_u64).map_err(Into::into),
/// );
/// # let _ = pipeline;
/// ```
pub struct FnPipeline<C, I, O, A> {
    producer_init: Option<ProducerHook<C>>,
    producer_work: ProducerWorkHook<C, I, O>,
    producer_end: Option<ProducerHook<C>>,
    consumer_init: Option<ConsumerHook<C>>,
    consumer_work: ConsumerWorkHook<C, O>,
    consumer_end: ConsumerEndHook<C, A>,
}

impl<C, I, O, A> FnPipeline<C, I, O, A> {
    pub fn new<W, CW, CE>(producer_work: W, consumer_work: CW, consumer_end: CE) -> Self
    where
        W: Fn(&Device, &mut C, I) -> Result<O> + Send + Sync + 'static,
        CW: Fn(&mut C, O) -> Result<()> + Send + Sync + 'static,
        CE: Fn(&mut C) -> Result<A> + Send + Sync + 'static,
    {
        Self {
            producer_init: None,
            producer_work: Box::new(producer_work),
            producer_end: None,
            consumer_init: None,
            consumer_work: Box::new(consumer_work),
            consumer_end: Box::new(consumer_end),
        }
    }

    pub fn with_producer_init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Device, &mut C) -> Result<()> + Send + Sync + 'static,
    {
        self.producer_init = Some(Box::new(hook));
        self
    }

    pub fn with_producer_end<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Device, &mut C) -> Result<()> + Send + Sync + 'static,
    {
        self.producer_end = Some(Box::new(hook));
        self
    }

    pub fn with_consumer_init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut C) -> Result<()> + Send + Sync + 'static,
    {
        self.consumer_init = Some(Box::new(hook));
        self
    }
}

impl<C, I, O, A> Pipeline for FnPipeline<C, I, O, A>
where
    C: Clone + Send + 'static,
    I: Send + 'static,
    O: Send + 'static,
    A: Send + 'static,
{
    type Config = C;
    type Input = I;
    type Output = O;
    type Aggregate = A;

    fn producer_init(&self, device: &Device, config: &mut C) -> Result<()> {
        match &self.producer_init {
            Some(hook) => hook(device, config),
            None => Ok(()),
        }
    }

    fn producer_work(&self, device: &Device, config: &mut C, input: I) -> Result<O> {
        (self.producer_work)(device, config, input)
    }

    fn producer_end(&self, device: &Device, config: &mut C) -> Result<()> {
        match &self.producer_end {
            Some(hook) => hook(device, config),
            None => Ok(()),
        }
    }

    fn consumer_init(&self, config: &mut C) -> Result<()> {
        match &self.consumer_init {
            Some(hook) => hook(config),
            None => Ok(()),
        }
    }

    fn consumer_work(&self, config: &mut C, output: O) -> Result<()> {
        (self.consumer_work)(config, output)
    }

    fn consumer_end(&self, config: &mut C) -> Result<A> {
        (self.consumer_end)(config)
    }
}
